use tractolabel_core::{ClusterId, TractError, TractErrorCode};
use rstest::rstest;

#[rstest]
#[case(TractError::InvalidPointsPerFiber { got: 1 }, TractErrorCode::InvalidPointsPerFiber)]
#[case(TractError::EmptyFiber { fiber: 3 }, TractErrorCode::EmptyFiber)]
#[case(
    TractError::ChannelLengthMismatch {
        channel: "FA".into(),
        fiber: 0,
        expected: 4,
        actual: 2,
    },
    TractErrorCode::ChannelLengthMismatch,
)]
#[case(
    TractError::NegativeClusterLabel { fiber: 1, label: -1 },
    TractErrorCode::NegativeClusterLabel,
)]
#[case(
    TractError::CentroidCountMismatch { labels: 2, rows: 1 },
    TractErrorCode::CentroidCountMismatch,
)]
#[case(TractError::ZeroCentroidDimension, TractErrorCode::ZeroCentroidDimension)]
#[case(
    TractError::InconsistentCentroid { cluster: ClusterId::new(2), fiber: 5 },
    TractErrorCode::InconsistentCentroid,
)]
#[case(
    TractError::LabelCountMismatch { fibers: 3, labels: 2 },
    TractErrorCode::LabelCountMismatch,
)]
#[case(
    TractError::MissingCentroid { cluster: ClusterId::new(9) },
    TractErrorCode::MissingCentroid,
)]
#[case(
    TractError::FiberCountMismatch { prior: 3, target: 4 },
    TractErrorCode::FiberCountMismatch,
)]
#[case(
    TractError::SampleCountMismatch { prior: 20, target: 2 },
    TractErrorCode::SampleCountMismatch,
)]
#[case(TractError::EmptyPrior, TractErrorCode::EmptyPrior)]
#[case(TractError::EmptyTarget, TractErrorCode::EmptyTarget)]
fn returns_expected_tract_code(#[case] error: TractError, #[case] expected: TractErrorCode) {
    assert_eq!(error.code(), expected);
    assert_eq!(error.code().to_string(), expected.as_str());
    assert!(expected.as_str().starts_with("TRACT_"));
}

#[rstest]
fn error_messages_name_the_offending_values() {
    let err = TractError::FiberCountMismatch {
        prior: 10,
        target: 12,
    };
    assert_eq!(
        err.to_string(),
        "prior has 10 fibers but the transformed tractography has 12"
    );
    let err = TractError::InconsistentCentroid {
        cluster: ClusterId::new(3),
        fiber: 7,
    };
    assert_eq!(
        err.to_string(),
        "fiber 7 disagrees with the centroid recorded for cluster 3"
    );
}
