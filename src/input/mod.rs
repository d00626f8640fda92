pub(crate) mod bundle;
pub(crate) mod resolver;

pub use bundle::{
    FileBundle, decode_compressed_bundle, decode_compressed_source, encode_bundle_to_hash,
    encode_compressed_source, parse_bundle_param, parse_bundle_value,
};
pub use resolver::{
    CircuitSource, DEFAULT_ENTRYPOINT, DEFAULT_EVALUATION_TIMEOUT, EvaluationJob,
    EvaluationSandbox, InputResolver,
};
