use crate::criteria::Comparison;
use quarry_schema::node::NodeError;
use thiserror::Error as ThisError;

///
/// CompileError
///
/// Programming errors surfaced during query compilation. None are retried
/// and none are recoverable mid-compilation; the single expected, recoverable
/// condition — an index-path resolution failure while partitioning key
/// conditions — is swallowed at the lookup site and never reaches this enum.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum CompileError {
    #[error("entities '{left}' and '{right}' have no declared relation")]
    MissingRelation { left: String, right: String },

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error("unsupported comparison: {comparison}")]
    UnsupportedComparison { comparison: Comparison },
}
