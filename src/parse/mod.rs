pub mod outline_parser;
pub mod outline_serializer;
pub mod span;
pub mod tag_parser;

pub use outline_parser::{ParseError, ParseErrorKind, ParseOptions, ParsedOutline, parse_outline};
pub use outline_serializer::serialize_outline;
pub use tag_parser::{parse_tags, strip_tags};
