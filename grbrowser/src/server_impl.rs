//! Implémentation du trait RadioBrowserExt pour grserver::Server
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use grbrowser::RadioBrowserExt;
//! use grserver::ServerBuilder;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut server = ServerBuilder::new_configured().build();
//! let state = server.init_radio_api().await?;
//!
//! server.start().await?;
//! # Ok(())
//! # }
//! ```

use crate::api_rest::{create_router, RadioBrowserState};
use crate::client::RadioBrowserClient;
use crate::openapi::ApiDoc;
use crate::server_ext::RadioBrowserExt;
use anyhow::Result;
use grserver::Server;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

impl RadioBrowserExt for Server {
    async fn init_radio_api(&mut self) -> Result<RadioBrowserState> {
        info!("Initializing radio-browser API...");

        let config = grconfig::get_config();
        let client = RadioBrowserClient::from_config(&config)
            .map_err(|e| anyhow::anyhow!("Failed to create radio-browser client: {}", e))?;

        self.init_radio_api_with_client(Arc::new(client)).await
    }

    async fn init_radio_api_with_client(
        &mut self,
        client: Arc<RadioBrowserClient>,
    ) -> Result<RadioBrowserState> {
        let state = RadioBrowserState::new(client);

        let router = create_router(state.clone());
        self.add_openapi("/", router, ApiDoc::openapi(), "radio").await;

        info!("Radio-browser API initialized");
        info!("API endpoints available at /api/*, docs at /swagger-ui/radio");

        Ok(state)
    }
}
