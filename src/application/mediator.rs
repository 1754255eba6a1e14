//! Mediator
//!
//! Routes a command to the handlers registered for its concrete type.
//!
//! The registry is built once at startup and only read afterwards, so a
//! `Mediator` can be shared behind an `Arc` without locking.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::errors::CommandError;
use crate::infrastructure::metrics;

/// An immutable request describing one operation.
pub trait Command: Send + Sync + 'static {
    /// What a handler produces for this command.
    type Output: Send + 'static;

    /// Short name used in logs and metrics.
    fn name() -> &'static str {
        let full = type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// Fulfills one command type.
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    async fn handle(&self, command: &C) -> Result<C::Output, CommandError>;
}

/// Handlers for one command type, type-erased for storage in the registry.
struct HandlerEntry {
    command_name: &'static str,
    /// `Vec<Arc<dyn CommandHandler<C>>>` for the `C` this entry is keyed by
    handlers: Box<dyn Any + Send + Sync>,
    handler_count: usize,
}

/// Registry + dispatcher routing commands to handlers.
#[derive(Default)]
pub struct Mediator {
    registry: HashMap<TypeId, HandlerEntry>,
}

impl Mediator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate handlers with command type `C`.
    ///
    /// Registering the same type again appends to the existing list, so each
    /// handler added twice will run twice.
    pub fn register<C, I>(&mut self, handlers: I) -> &mut Self
    where
        C: Command,
        I: IntoIterator<Item = Arc<dyn CommandHandler<C>>>,
    {
        let entry = self
            .registry
            .entry(TypeId::of::<C>())
            .or_insert_with(|| HandlerEntry {
                command_name: C::name(),
                handlers: Box::new(Vec::<Arc<dyn CommandHandler<C>>>::new()),
                handler_count: 0,
            });

        if let Some(list) = entry
            .handlers
            .downcast_mut::<Vec<Arc<dyn CommandHandler<C>>>>()
        {
            list.extend(handlers);
            entry.handler_count = list.len();
            tracing::debug!(command = C::name(), handlers = list.len(), "Handlers registered");
        }

        self
    }

    /// Register a single handler for `C`.
    pub fn register_handler<C, H>(&mut self, handler: H) -> &mut Self
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let handler: Arc<dyn CommandHandler<C>> = Arc::new(handler);
        self.register::<C, _>([handler])
    }

    fn handlers_for<C: Command>(&self) -> Option<&[Arc<dyn CommandHandler<C>>]> {
        self.registry
            .get(&TypeId::of::<C>())
            .and_then(|entry| {
                entry
                    .handlers
                    .downcast_ref::<Vec<Arc<dyn CommandHandler<C>>>>()
            })
            .map(Vec::as_slice)
            .filter(|handlers| !handlers.is_empty())
    }

    pub fn is_registered<C: Command>(&self) -> bool {
        self.handlers_for::<C>().is_some()
    }

    /// Fail with `HandlersNotRegistered` unless `C` has at least one handler.
    pub fn require<C: Command>(&self) -> Result<&Self, CommandError> {
        if self.is_registered::<C>() {
            Ok(self)
        } else {
            Err(CommandError::HandlersNotRegistered(C::name()))
        }
    }

    /// Names of every command type with at least one handler, sorted.
    pub fn registered_commands(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .registry
            .values()
            .filter(|entry| entry.handler_count > 0)
            .map(|entry| entry.command_name)
            .collect();
        names.sort_unstable();
        names
    }

    /// Run every handler for the command, in registration order, one after
    /// another. The first failure stops the run and is returned.
    pub async fn dispatch<C: Command>(&self, command: C) -> Result<Vec<C::Output>, CommandError> {
        let handlers = self
            .handlers_for::<C>()
            .ok_or(CommandError::HandlersNotRegistered(C::name()))?;

        tracing::debug!(command = C::name(), handlers = handlers.len(), "Dispatching command");

        let mut results = Vec::with_capacity(handlers.len());
        for handler in handlers {
            match handler.handle(&command).await {
                Ok(output) => results.push(output),
                Err(error) => {
                    metrics::record_command(C::name(), false);
                    return Err(error);
                }
            }
        }

        metrics::record_command(C::name(), true);
        Ok(results)
    }

    /// Dispatch and keep only the first handler's result.
    pub async fn dispatch_one<C: Command>(&self, command: C) -> Result<C::Output, CommandError> {
        self.dispatch(command)
            .await?
            .into_iter()
            .next()
            .ok_or(CommandError::HandlersNotRegistered(C::name()))
    }
}
