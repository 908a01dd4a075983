//! Extension grserver pour la façade radio-browser
//!
//! Ce module fournit un trait d'extension pour ajouter l'API radio-browser
//! à un serveur grserver.

use crate::api_rest::RadioBrowserState;
use crate::client::RadioBrowserClient;
use anyhow::Result;
use std::sync::Arc;

/// Trait pour étendre grserver avec l'API radio-browser
///
/// `grserver` définit un serveur HTTP générique et `grbrowser` l'étend via ce
/// trait, sans que le serveur ait besoin de connaître `grbrowser`.
///
/// # Exemple
///
/// ```rust,no_run
/// use grbrowser::RadioBrowserExt;
/// use grserver::ServerBuilder;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut server = ServerBuilder::new_configured().build();
///
///     server.init_radio_api().await?;
///
///     server.start().await?;
///     server.wait().await;
///     Ok(())
/// }
/// ```
pub trait RadioBrowserExt {
    /// Initialise le client depuis la configuration et enregistre les routes HTTP
    ///
    /// # Routes enregistrées
    ///
    /// - `GET /`, `GET /info`
    /// - `GET /api/stations/{popular,christian,search,by-genre}`
    /// - `GET /api/stations/by-country/{country_code}`, `GET /api/stations/by-tag/{tag}`
    /// - `GET /api/{countries,languages,tags,genres}`
    /// - `GET /api/station/{station_id}`, `POST /api/station/{station_id}/click`
    /// - Swagger UI : `/swagger-ui/radio`, spécification : `/api-docs/radio.json`
    async fn init_radio_api(&mut self) -> Result<RadioBrowserState>;

    /// Comme `init_radio_api()` mais avec un client déjà construit
    ///
    /// Permet d'injecter un résolveur ou un transport de test.
    async fn init_radio_api_with_client(
        &mut self,
        client: Arc<RadioBrowserClient>,
    ) -> Result<RadioBrowserState>;
}

// L'implémentation est dans server_impl.rs
