//! Component runtime — runs the bot's long-lived parts side by side.
//!
//! A [`Component`] (the Telegram channel, the broadcast scheduler) captures
//! its shared state at construction and is consumed by [`run_components`],
//! which spawns each one on the tokio pool. The first component to fail
//! cancels the shared [`CancellationToken`] so the others wind down too.

use std::future::Future;
use std::pin::Pin;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::AppError;

/// A boxed, owned future returned by [`Component::run`].
pub type ComponentFuture = Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'static>>;

pub trait Component: Send + 'static {
    /// Stable identifier used in log messages.
    fn id(&self) -> &str;

    /// Consume the component and return its run-loop. Must return once
    /// `shutdown` is cancelled.
    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture;
}

/// Run every component until all have exited; return the first error.
pub async fn run_components(
    components: Vec<Box<dyn Component>>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let mut set: JoinSet<(String, Result<(), AppError>)> = JoinSet::new();

    for component in components {
        let id = component.id().to_string();
        let token = shutdown.clone();
        debug!(component = %id, "spawning component");
        set.spawn(async move { (id, component.run(token).await) });
    }

    let mut first_err: Option<AppError> = None;

    while let Some(res) = set.join_next().await {
        match res {
            Err(e) => {
                error!("component panicked: {e}");
                shutdown.cancel();
                first_err.get_or_insert_with(|| AppError::Comms(format!("component panicked: {e}")));
            }
            Ok((id, Err(e))) => {
                error!(component = %id, "component error: {e}");
                shutdown.cancel();
                first_err.get_or_insert(e);
            }
            Ok((id, Ok(()))) => info!(component = %id, "component stopped"),
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Waits(&'static str);

    impl Component for Waits {
        fn id(&self) -> &str {
            self.0
        }

        fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
            Box::pin(async move {
                shutdown.cancelled().await;
                Ok(())
            })
        }
    }

    struct Fails;

    impl Component for Fails {
        fn id(&self) -> &str {
            "fails"
        }

        fn run(self: Box<Self>, _shutdown: CancellationToken) -> ComponentFuture {
            Box::pin(async { Err(AppError::Comms("boom".into())) })
        }
    }

    #[tokio::test]
    async fn failure_cancels_siblings() {
        let shutdown = CancellationToken::new();
        let res = run_components(vec![Box::new(Waits("a")), Box::new(Fails)], shutdown.clone()).await;
        assert!(res.unwrap_err().to_string().contains("boom"));
        assert!(shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn clean_shutdown_is_ok() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let res = run_components(vec![Box::new(Waits("a")), Box::new(Waits("b"))], shutdown).await;
        assert!(res.is_ok());
    }
}
