//! Matrix layouts used for feature and label data.
//!
//! `matrix` holds the layouts data may arrive in, `format` decides whether a
//! sparse layout pays off and `prepared` converts data into what the induction
//! engine consumes.
pub mod format;
pub mod matrix;
pub mod prepared;

pub use format::prefer_sparse;
pub use matrix::{CompressedMatrix, CooMatrix, DokMatrix, Element, InputMatrix, LilMatrix};
pub use prepared::{
    prepare_feature_matrix, prepare_label_matrix, prepare_matrix, FeatureMatrix, LabelMatrix,
    NominalFeatureMask, PreparedMatrix,
};
