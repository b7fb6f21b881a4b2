//! Query orchestration: planning, concurrent range scans, merge and exact
//! filtering.

pub mod filter;
pub mod orchestrator;
pub mod request;

pub use filter::{ExactFilter, RADIUS_TOLERANCE_METERS};
pub use orchestrator::{execute_plan, plan_region};
pub use request::{
    QueryOptions, QueryOutput, QueryPlan, QueryRadiusInput, QueryRectangleInput, QueryStats,
};
