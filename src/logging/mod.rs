use std::io::{self, Write};

use env_logger::Builder;
use log::LevelFilter;
use tokio::{
    fs::{create_dir_all, metadata, OpenOptions},
    io::{AsyncWriteExt, BufWriter},
    sync::{
        mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
        watch,
    },
};

use crate::{
    config,
    core::{IntegratorError, IntegratorResult},
};

pub struct AsyncWriter {
    sender: UnboundedSender<Vec<u8>>,
}

impl Write for AsyncWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let data = buf.to_vec();
        self.sender.send(data).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Routes `env_logger` output to a file through a background task.
pub struct Logger {
    sender: UnboundedSender<Vec<u8>>,
    receiver: UnboundedReceiver<Vec<u8>>,
    config: config::Log,
}

impl Logger {
    pub fn new(config: config::Log) -> Self {
        let (sender, receiver) = unbounded_channel::<Vec<u8>>();
        Self {
            sender,
            receiver,
            config,
        }
    }

    fn create_async_writer(&self) -> AsyncWriter {
        AsyncWriter {
            sender: self.sender.clone(),
        }
    }

    pub fn init_env_logger(&self) -> IntegratorResult<()> {
        let writer = self.create_async_writer();
        Builder::from_env(env_logger::Env::default())
            .filter(None, LevelFilter::Info)
            .target(env_logger::Target::Pipe(Box::new(writer)))
            .try_init()
            .map_err(|e| IntegratorError::Configuration(format!("Failed to init logger: {e}")))
    }

    /// Append log lines to the configured file until `shutdown` flips to
    /// true, then drain what is already queued and flush.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> IntegratorResult<()> {
        let Logger {
            sender,
            mut receiver,
            config,
        } = self;
        drop(sender);

        let log_file_path = &config.path;

        if let Some(parent) = std::path::Path::new(log_file_path).parent() {
            if !parent.as_os_str().is_empty() && metadata(parent).await.is_err() {
                create_dir_all(parent).await?;
            }
        }

        let mut file = BufWriter::new(
            OpenOptions::new()
                .append(true)
                .create(true)
                .open(log_file_path)
                .await?,
        );

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                },

                data = receiver.recv() => {
                    match data {
                        Some(data) => {
                            if let Err(e) = file.write_all(&data).await {
                                eprintln!("Failed to write to log file: {e}");
                            }
                        }
                        None => break,
                    }
                }
            }
        }

        while let Ok(data) = receiver.try_recv() {
            file.write_all(&data).await?;
        }

        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logger_writes_until_shutdown() {
        let path = std::env::temp_dir()
            .join(format!("weaver-log-{}", uuid::Uuid::new_v4()))
            .join("weaver.log");
        let logger = Logger::new(config::Log {
            path: path.to_string_lossy().into_owned(),
        });
        let mut writer = logger.create_async_writer();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        writer.write_all(b"first line\n").unwrap();
        writer.write_all(b"second line\n").unwrap();
        shutdown_tx.send(true).unwrap();

        logger.run(shutdown_rx).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "first line\nsecond line\n");

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn test_writer_fails_after_logger_dropped() {
        let logger = Logger::new(config::Log {
            path: "unused.log".to_string(),
        });
        let mut writer = logger.create_async_writer();
        drop(logger);
        assert!(writer.write(b"lost").is_err());
    }
}
