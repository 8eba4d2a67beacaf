//! Flow metrics over non-deployment work: velocity, flow time, flow
//! efficiency, flow load and flow distribution.

pub mod distribution;
pub mod efficiency;
pub mod flow_time;
pub mod load;
pub mod velocity;

pub use distribution::{calculate_flow_distribution, pooled_distribution};
pub use efficiency::{calculate_flow_efficiency, pooled_efficiency};
pub use flow_time::calculate_flow_time;
pub use load::calculate_flow_load;
pub use velocity::calculate_flow_velocity;
