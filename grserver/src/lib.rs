//! # grserver - Serveur web haut niveau basé sur Axum
//!
//! Cette crate fournit une abstraction simple pour le serveur HTTP de Global Radio.
//!
//! ## Fonctionnalités
//!
//! - **API de haut niveau** : routes JSON, handlers avec état, sous-routers
//! - **CORS** : accès depuis n'importe quelle origine
//! - **Logs** : buffer circulaire, Server-Sent Events et niveau modifiable à chaud
//! - **Documentation OpenAPI** : Swagger UI par API montée
//! - **Arrêt gracieux** : gestion propre de Ctrl+C
//!
//! ## Architecture
//!
//! - [`server`] : le serveur et son builder
//! - [`logs`] : système de logs et routes associées
//!
//! Les crates métier étendent [`Server`] par des traits d'extension
//! (voir `grbrowser::RadioBrowserExt`) sans que `grserver` les connaisse.
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use grserver::{ServerBuilder, logs::LoggingOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = ServerBuilder::new("MyServer", "0.0.0.0", 8080).build();
//!     server.init_logging(LoggingOptions::default()).await;
//!
//!     server.add_route("/api/status", || async {
//!         serde_json::json!({"status": "ok"})
//!     }).await;
//!
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod logs;
pub mod server;

pub use logs::{BufferLayer, LogState, LoggingOptions, log_dump, log_sse};
pub use server::{Server, ServerBuilder, ServerInfo};
