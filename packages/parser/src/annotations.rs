//! Extraction of the `@vrn-bindings` comment block.
//!
//! A view file carries its state/action contract in a leading block comment:
//! ```text
//! /**
//!  * @vrn-bindings
//!  * state: {
//!  *   message: string,
//!  * }
//!  * actions: {
//!  *   handlePress: function,
//!  * }
//!  */
//! ```
//! Extraction is tolerant: malformed or partial blocks yield whatever
//! key/type pairs parse, and never fail.

use crate::ast::{BindingDecl, Bindings};

/// Marker token identifying a bindings comment block
pub const BINDINGS_MARKER: &str = "@vrn-bindings";

/// Does this block comment carry a bindings contract?
pub fn is_bindings_comment(comment: &str) -> bool {
    comment.contains(BINDINGS_MARKER)
}

/// Parse a `@vrn-bindings` block comment into a `Bindings` contract.
///
/// `comment` is the raw comment text, delimiters included.
pub fn parse_bindings_comment(comment: &str) -> Bindings {
    let mut bindings = Bindings::default();
    let inner = strip_delimiters(comment);

    enum Section {
        None,
        State,
        Actions,
    }
    let mut section = Section::None;

    for line in inner.lines() {
        let cleaned = clean_doc_line(line);

        if cleaned.starts_with("state:") {
            section = Section::State;
            continue;
        }
        if cleaned.starts_with("actions:") {
            section = Section::Actions;
            continue;
        }

        if let Some((name, ty)) = cleaned.split_once(':') {
            let name = name.trim();
            let ty = ty.trim().trim_end_matches(',').trim_end_matches('}').trim();

            if name.is_empty() || ty.is_empty() || name.starts_with('*') || name.starts_with('}') {
                continue;
            }

            let decl = BindingDecl::new(name, ty);
            match section {
                Section::State => bindings.state.push(decl),
                Section::Actions => bindings.actions.push(decl),
                Section::None => {}
            }
        }
    }

    bindings
}

/// Reconstruct the comment block from a `Bindings` contract.
///
/// The output format must stay symmetric with `parse_bindings_comment` for
/// round-trip fidelity.
pub fn render_bindings_comment(bindings: &Bindings) -> String {
    let mut out = String::from("/**\n * @vrn-bindings\n * state: {\n");
    for decl in &bindings.state {
        out.push_str(&format!(" *   {}: {},\n", decl.name, decl.ty));
    }
    out.push_str(" * }\n * actions: {\n");
    for decl in &bindings.actions {
        out.push_str(&format!(" *   {}: {},\n", decl.name, decl.ty));
    }
    out.push_str(" * }\n */");
    out
}

fn strip_delimiters(comment: &str) -> &str {
    let trimmed = comment.trim();
    let without_start = trimmed
        .strip_prefix("/**")
        .or_else(|| trimmed.strip_prefix("/*"))
        .unwrap_or(trimmed);
    without_start.strip_suffix("*/").unwrap_or(without_start)
}

/// Remove the leading `*` decoration common to doc comment lines
fn clean_doc_line(line: &str) -> &str {
    let trimmed = line.trim();
    match trimmed.strip_prefix('*') {
        Some(rest) => rest.trim_start(),
        None => trimmed,
    }
}
