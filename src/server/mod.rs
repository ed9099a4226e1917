//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! Este módulo implementa el lado de red del servidor:
//! 1. `tcp`: escucha en un puerto y acepta conexiones
//! 2. `pool`: pool fijo de N workers que las atiende
//! 3. `connection`: lee, parsea, resuelve y responde una conexión
//! 4. `signal`: Ctrl+C dispara el shutdown ordenado

pub mod connection;
pub mod pool;
pub mod signal;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use connection::{ConnectionError, ConnectionHandler};
pub use pool::{PoolError, WorkerPool};
pub use signal::spawn_ctrl_c_listener;
pub use tcp::{Server, ServerError, ShutdownHandle};
