// SPDX-License-Identifier: GPL-3.0-only
//! SIGINT/SIGTERM handling
//!
//! The pipeline is plain threads, so a small current-thread tokio runtime
//! on a helper thread waits for the signals and trips the stop handle.

use std::io;
use std::thread;

use tokio::signal;

use crate::pipeline::StopHandle;

pub fn spawn_signal_listener<E: Send + 'static>(stop: StopHandle<E>) -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()?;

    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            runtime.block_on(async {
                let ctrl_c = async {
                    if let Err(e) = signal::ctrl_c().await {
                        error!("Failed to listen for SIGINT: {}", e);
                        std::future::pending::<()>().await;
                    }
                };

                let terminate = async {
                    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                        Ok(mut sigterm) => {
                            sigterm.recv().await;
                        }
                        Err(e) => {
                            error!("Failed to listen for SIGTERM: {}", e);
                            std::future::pending::<()>().await;
                        }
                    }
                };

                tokio::select! {
                    () = ctrl_c => info!("Received SIGINT, shutting down"),
                    () = terminate => info!("Received SIGTERM, shutting down"),
                }
            });
            stop.stop();
        })?;

    Ok(())
}
