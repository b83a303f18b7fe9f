//! Executes instructions against a session context.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use slim_fixtures::{
    Args, ConversionOverrides, ConverterRegistry, FixtureCatalog, MethodDescriptor, Value,
    ValueType, arity_error,
};
use slim_protocol::{Instruction, Item, Operation, Outcome, ParsedInstruction, Response, pack};
use tracing::debug;

use super::DISPATCH_TARGET;
use super::context::SessionContext;
use super::errors::ExecutionError;

/// Runs instructions in order, turning every failure into an exception
/// result for the instruction that caused it.
///
/// The executor holds only process-wide collaborators. All session state
/// lives in the [`SessionContext`] passed to each call, so one executor can
/// serve any number of sessions.
#[derive(Debug, Clone)]
pub struct Executor {
    catalog: Arc<FixtureCatalog>,
    converters: Arc<ConverterRegistry>,
}

impl Executor {
    /// Builds an executor over a fixture catalogue and converter registry.
    #[must_use]
    pub fn new(catalog: Arc<FixtureCatalog>, converters: Arc<ConverterRegistry>) -> Self {
        Self {
            catalog,
            converters,
        }
    }

    /// The fixture catalogue.
    #[must_use]
    pub fn catalog(&self) -> &Arc<FixtureCatalog> {
        &self.catalog
    }

    /// The converter registry.
    #[must_use]
    pub fn converters(&self) -> &Arc<ConverterRegistry> {
        &self.converters
    }

    /// Executes a parsed batch, returning one response per entry in order.
    pub fn execute_batch(
        &self,
        context: &mut SessionContext,
        batch: Vec<ParsedInstruction>,
    ) -> Vec<Response> {
        batch
            .into_iter()
            .map(|entry| match entry {
                Ok(instruction) => self.execute(context, &instruction),
                Err(malformed) => {
                    let error = ExecutionError::Malformed {
                        source: malformed.error,
                    };
                    debug!(
                        target: DISPATCH_TARGET,
                        id = %malformed.id,
                        error = %error,
                        "rejected malformed instruction"
                    );
                    Response::new(malformed.id, error.into_outcome())
                }
            })
            .collect()
    }

    /// Executes one instruction.
    pub fn execute(&self, context: &mut SessionContext, instruction: &Instruction) -> Response {
        let outcome = match self.run(context, &instruction.operation) {
            Ok(outcome) => outcome,
            Err(error) => {
                debug!(
                    target: DISPATCH_TARGET,
                    id = %instruction.id,
                    kind = %instruction.operation.kind(),
                    error = %error,
                    "instruction failed"
                );
                error.into_outcome()
            }
        };
        Response::new(instruction.id.clone(), outcome)
    }

    fn run(
        &self,
        context: &mut SessionContext,
        operation: &Operation,
    ) -> Result<Outcome, ExecutionError> {
        match operation {
            Operation::Import { path } => self.import(context, path),
            Operation::Make {
                instance,
                class,
                args,
            } => self.make(context, instance, class, args),
            Operation::Call {
                instance,
                method,
                args,
            } => self
                .call(context, instance, method, args)
                .map(|(outcome, _)| outcome),
            Operation::CallAndAssign {
                symbol,
                instance,
                method,
                args,
            } => {
                let (outcome, wire) = self.call(context, instance, method, args)?;
                context.bind_symbol(symbol.as_str(), wire);
                Ok(outcome)
            }
            Operation::Assign { symbol, value } => {
                let resolved = context.symbols().substitute(value)?;
                context.bind_symbol(symbol.as_str(), resolved);
                Ok(Outcome::Acknowledged)
            }
        }
    }

    fn import(&self, context: &mut SessionContext, path: &str) -> Result<Outcome, ExecutionError> {
        let trimmed = path.trim();
        if trimmed.is_empty() || trimmed.contains('\0') {
            return Err(ExecutionError::InvalidImportPath {
                path: path.to_owned(),
            });
        }
        if !self.catalog.contains_package(trimmed) {
            debug!(
                target: DISPATCH_TARGET,
                path = trimmed,
                "imported path has no registered fixtures yet"
            );
        }
        context.add_search_path(trimmed);
        Ok(Outcome::Acknowledged)
    }

    fn make(
        &self,
        context: &mut SessionContext,
        instance: &str,
        class: &str,
        args: &[Item],
    ) -> Result<Outcome, ExecutionError> {
        let class_name = context.symbols().substitute(class)?;
        let args = context.symbols().substitute_all(args)?;
        let class = self
            .catalog
            .resolve(&class_name, context.search_paths())
            .map_err(|source| ExecutionError::NoClass {
                class: class_name.clone(),
                source,
            })?;

        let params = class.constructor_params();
        if args.len() != params.len() {
            return Err(ExecutionError::instantiation(
                class.name(),
                &arity_error(params.len(), args.len()),
            ));
        }
        let values = self.convert_args(&args, params, None)?;
        let created = catch_panic(|| class.instantiate(values)).map_err(|message| {
            ExecutionError::Instantiation {
                class: class.name().to_owned(),
                message,
                stop_test: false,
            }
        })?;
        let fixture =
            created.map_err(|error| ExecutionError::instantiation(class.name(), &error))?;
        context.insert_instance(instance, fixture);
        debug!(
            target: DISPATCH_TARGET,
            instance,
            class = class.name(),
            "made fixture instance"
        );
        Ok(Outcome::Acknowledged)
    }

    /// Invokes a method and returns the outcome plus the wire string a
    /// symbol assignment would store.
    fn call(
        &self,
        context: &mut SessionContext,
        instance: &str,
        method: &str,
        args: &[Item],
    ) -> Result<(Outcome, String), ExecutionError> {
        let args = context.symbols().substitute_all(args)?;
        let (target, descriptor) = resolve_method(context, instance, method)?;
        let params = descriptor.params();
        if args.len() != params.len() {
            return Err(arity_error(params.len(), args.len()).into());
        }
        let values = self.convert_args(&args, params, descriptor.overrides())?;

        let fixture = context
            .instance_mut(&target)
            .ok_or_else(|| ExecutionError::NoInstance {
                instance: target.clone(),
            })?;
        let returned = catch_panic(|| fixture.invoke(&descriptor, values)).map_err(|message| {
            ExecutionError::Invocation {
                message,
                stop_test: false,
            }
        })??;

        let item = self
            .converters
            .convert_out(&returned, descriptor.overrides())?;
        let wire = match &item {
            Item::Text(text) => text.clone(),
            Item::List(items) => pack(items),
        };
        let outcome = if matches!(returned, Value::Void) {
            Outcome::Void
        } else {
            Outcome::Value(item)
        };
        Ok((outcome, wire))
    }

    fn convert_args(
        &self,
        args: &[Item],
        params: &[ValueType],
        overrides: Option<&ConversionOverrides>,
    ) -> Result<Args, ExecutionError> {
        args.iter()
            .zip(params)
            .map(|(item, param)| self.converters.convert_in(item, param, overrides))
            .collect::<Result<Vec<_>, _>>()
            .map(Args::new)
            .map_err(ExecutionError::from)
    }
}

/// Finds the instance that will handle `method`: the named instance itself,
/// or failing that the most recently made library that has the method.
fn resolve_method(
    context: &SessionContext,
    instance: &str,
    method: &str,
) -> Result<(String, Arc<MethodDescriptor>), ExecutionError> {
    let fixture = context
        .instance(instance)
        .ok_or_else(|| ExecutionError::NoInstance {
            instance: instance.to_owned(),
        })?;
    if let Some(descriptor) = fixture.find_method(method) {
        return Ok((instance.to_owned(), descriptor));
    }
    context
        .libraries()
        .find_map(|library| {
            context
                .instance(library)
                .and_then(|candidate| candidate.find_method(method))
                .map(|descriptor| (library.to_owned(), descriptor))
        })
        .ok_or_else(|| ExecutionError::NoMethod {
            method: method.to_owned(),
            class: fixture.class_name().to_owned(),
        })
}

fn catch_panic<T>(body: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(body)).map_err(|payload| panic_message(&*payload))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "no message".to_owned());
    format!("fixture panicked: {detail}")
}
