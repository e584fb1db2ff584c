pub mod annotations;
pub mod ast;
pub mod error;
pub mod generator;
pub mod id_generator;
pub mod js_ast;
pub mod parser;
pub mod tokenizer;

#[cfg(test)]
mod tests_roundtrip;

pub use ast::{
    update_node, Bindings, BindingDecl, DocumentNode, NodeBindings, NodeKind, NodeMetadata,
    NodeUpdate, PropEntry, PropValue,
};
pub use error::{GeneratorError, ParseError, ParseResult};
pub use generator::{generate, Generator};
pub use parser::{parse, ParsedViewFile, Parser};
pub use tokenizer::{tokenize, Token};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizer_basic() {
        let source = "export default function";
        let tokens = tokenize(source);
        assert_eq!(tokens.len(), 3);
    }
}
