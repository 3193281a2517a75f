mod forecast_point;
mod reading;
mod signal;

pub use forecast_point::ForecastPoint;
pub use reading::Reading;
pub use signal::{SignalType, UnknownSignal};
