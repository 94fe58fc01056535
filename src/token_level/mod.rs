// Token-level modelling: weight each token's context words by their
// association with the token's type, swap them for second-order type
// vectors, and compare the resulting token vectors.

pub mod cws;
pub mod distance;
pub mod vectors;
pub mod weights;
