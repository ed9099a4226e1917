//! # Pool de Workers
//! src/server/pool.rs
//!
//! Pool de tamaño fijo creado una sola vez al arrancar el servidor.
//!
//! Los jobs se entregan por un canal de rendezvous (`sync_channel(0)`):
//! `submit` solo retorna cuando un worker libre tomó el job, así que con los
//! N workers ocupados el acceptor se bloquea en vez de crear más threads.
//! Nunca hay más de N handlers corriendo a la vez.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Errores del pool
#[derive(Debug)]
pub enum PoolError {
    /// Se pidió un pool de 0 workers
    ZeroWorkers,

    /// El pool ya no acepta jobs
    ShutDown,

    /// El sistema no pudo crear un thread
    Spawn(std::io::Error),
}

impl std::fmt::Display for PoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolError::ZeroWorkers => write!(f, "Worker pool needs at least one worker"),
            PoolError::ShutDown => write!(f, "Worker pool is shut down"),
            PoolError::Spawn(e) => write!(f, "Failed to spawn worker thread: {}", e),
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PoolError::Spawn(e) => Some(e),
            _ => None,
        }
    }
}

struct Worker {
    id: usize,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(id: usize, receiver: Arc<Mutex<Receiver<Job>>>) -> Result<Self, PoolError> {
        let thread = thread::Builder::new()
            .name(format!("worker-{}", id))
            .spawn(move || Self::worker_loop(id, receiver))
            .map_err(PoolError::Spawn)?;

        Ok(Self {
            id,
            thread: Some(thread),
        })
    }

    /// Loop principal del worker
    fn worker_loop(id: usize, receiver: Arc<Mutex<Receiver<Job>>>) {
        debug!(worker = id, "Worker started");

        loop {
            // El lock se suelta apenas recv() entrega el job
            let message = match receiver.lock() {
                Ok(guard) => guard.recv(),
                Err(_) => {
                    error!(worker = id, "Job receiver lock poisoned");
                    break;
                }
            };

            // Canal cerrado: el pool se está apagando
            let Ok(job) = message else {
                break;
            };

            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                error!(worker = id, "Job panicked: {}", panic_message(payload.as_ref()));
            }
        }

        debug!(worker = id, "Worker stopped");
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Pool de N threads que ejecuta jobs de a uno por worker
pub struct WorkerPool {
    workers: Vec<Worker>,
    sender: Option<SyncSender<Job>>,
}

impl WorkerPool {
    /// Crea el pool y arranca los `size` workers
    ///
    /// # Errores
    ///
    /// `PoolError::ZeroWorkers` si `size == 0`, `PoolError::Spawn` si el
    /// sistema no deja crear un thread.
    pub fn new(size: usize) -> Result<Self, PoolError> {
        if size == 0 {
            return Err(PoolError::ZeroWorkers);
        }

        let (sender, receiver) = mpsc::sync_channel::<Job>(0);
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            workers.push(Worker::spawn(id, Arc::clone(&receiver))?);
        }

        info!(workers = size, "Worker pool started");

        Ok(Self {
            workers,
            sender: Some(sender),
        })
    }

    /// Cantidad fija de workers
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Entrega un job a un worker libre
    ///
    /// Bloquea mientras los N workers estén ocupados.
    pub fn submit<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(PoolError::ShutDown)?;
        sender.send(Box::new(job)).map_err(|_| PoolError::ShutDown)
    }

    /// Apaga el pool esperando a que cada worker termine su job actual
    pub fn shutdown(mut self) {
        self.drain();
    }

    fn drain(&mut self) {
        // Cerrar el canal: cada worker sale del loop al terminar lo que tenga
        if self.sender.take().is_none() {
            return;
        }

        info!(workers = self.workers.len(), "Draining worker pool");

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    error!(worker = worker.id, "Worker thread panicked");
                }
            }
        }

        info!("Worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.drain();
    }
}
