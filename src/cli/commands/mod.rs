use anyhow::Result;

pub mod calculate;
pub mod forecast;
pub mod show;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}
