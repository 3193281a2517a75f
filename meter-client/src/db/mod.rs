pub mod forecast_queries;
pub mod reading_queries;

pub use forecast_queries::insert_forecast_points_if_absent;
pub use reading_queries::readings_in_range;
