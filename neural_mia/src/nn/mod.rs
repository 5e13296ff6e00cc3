//! EMG regression models.
//!
//! Two backbones implement [`EmgRegressor`]: a transformer over per-frame
//! tokens and a convolutional network. [`EmgNet`] wraps whichever one the
//! configuration selects.

mod conv;
mod model;
mod transformer;

pub use conv::ConvEmg;
pub use model::{EmgNet, EmgRegressor};
pub use transformer::TransformerEmg;
