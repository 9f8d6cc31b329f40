pub mod init;
pub mod seed;

use async_trait::async_trait;

#[async_trait]
pub trait Action {
    async fn execute(&self) -> anyhow::Result<()>;
}
