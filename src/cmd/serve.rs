//! Serve command - run the HTTP API

use crate::api;
use crate::core::ConfigurationTable;
use clap::Args;

#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
}

impl ServeCommand {
    pub fn exec(&self, config: ConfigurationTable) -> anyhow::Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(api::run_http_server(config, self.port))?;
        Ok(())
    }
}
