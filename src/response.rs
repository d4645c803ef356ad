//! Lazy result cell.
//!
//! `ResponseInfo` holds a named result whose payload may be produced on
//! demand by a stored callback. The callback is consume-once: after its
//! first successful run the payload is cached and the callback never runs
//! again for that cell. A callback failure propagates to the caller and
//! leaves the callback armed, so a retry policy wrapped around `resolve`
//! may legitimately re-invoke it.
//!
//! An optional extractor derives a read-time view of the payload without
//! mutating it; the extractor is a pure function applied on every `data`
//! read, never stored state.

use crate::field::{FieldAccess, FieldError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Consume-once callback state.
enum CallbackState<T, E> {
    /// Armed; the callback has not yet run successfully.
    Pending(Box<dyn FnMut() -> Result<T, E> + Send>),
    /// The callback ran successfully; it never runs again.
    Resolved,
    /// The cell was constructed without a callback.
    Absent,
}

impl<T, E> fmt::Debug for CallbackState<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending(_) => write!(f, "Pending"),
            Self::Resolved => write!(f, "Resolved"),
            Self::Absent => write!(f, "Absent"),
        }
    }
}

/// A named result whose payload may be produced lazily, at most once.
pub struct ResponseInfo<T, E> {
    response: Option<T>,
    description: Option<String>,
    callback: CallbackState<T, E>,
    extract: Option<Arc<dyn Fn(&T) -> T + Send + Sync>>,
    extras: BTreeMap<String, Value>,
}

impl<T: fmt::Debug, E> fmt::Debug for ResponseInfo<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseInfo")
            .field("response", &self.response)
            .field("description", &self.description)
            .field("callback", &self.callback)
            .field("extract", &self.extract.as_ref().map(|_| "<extract>"))
            .field("extras", &self.extras)
            .finish()
    }
}

impl<T, E> ResponseInfo<T, E> {
    /// Construct a cell field by field.
    pub fn builder() -> ResponseInfoBuilder<T, E> {
        ResponseInfoBuilder::default()
    }

    /// Cell holding an already-known payload.
    pub fn from_response(response: T) -> Self {
        Self::builder().response(response).build()
    }

    /// Cell whose payload comes from `callback` on first resolution.
    pub fn from_callback<F>(callback: F) -> Self
    where
        F: FnMut() -> Result<T, E> + Send + 'static,
    {
        Self::builder().callback(callback).build()
    }

    /// Borrow the current payload, if any.
    pub fn response(&self) -> Option<&T> {
        self.response.as_ref()
    }

    /// Mutably borrow the current payload, if any.
    pub fn response_mut(&mut self) -> Option<&mut T> {
        self.response.as_mut()
    }

    /// Overwrite the payload. Does not touch the callback state.
    pub fn set_response(&mut self, value: T) {
        self.response = Some(value);
    }

    /// The cell's description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Set the cell's description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Read a caller-supplied named attribute.
    pub fn extra(&self, name: &str) -> Option<&Value> {
        self.extras.get(name)
    }

    /// Set a caller-supplied named attribute.
    pub fn set_extra(&mut self, name: impl Into<String>, value: Value) {
        self.extras.insert(name.into(), value);
    }

    /// Whether an armed callback is still waiting to run.
    pub fn has_pending_callback(&self) -> bool {
        matches!(self.callback, CallbackState::Pending(_))
    }

    /// Run the callback if it is still armed, storing its result as the
    /// payload. Idempotent: once the callback has run successfully, further
    /// calls do nothing. A callback failure propagates and leaves the
    /// callback armed for a later attempt.
    pub fn resolve(&mut self) -> Result<(), E> {
        if let CallbackState::Pending(callback) = &mut self.callback {
            let value = callback()?;
            self.response = Some(value);
            self.callback = CallbackState::Resolved;
        }
        Ok(())
    }

    /// The derived view of the payload: resolve the callback if needed, then
    /// apply the extractor to the current payload (or clone it when no
    /// extractor is configured). `None` when the cell has neither a payload
    /// nor a callback.
    pub fn data(&mut self) -> Result<Option<T>, E>
    where
        T: Clone,
    {
        self.resolve()?;
        let view = match (&self.response, &self.extract) {
            (Some(response), Some(extract)) => Some(extract(response)),
            (Some(response), None) => Some(response.clone()),
            (None, _) => None,
        };
        Ok(view)
    }
}

impl<T, E> FieldAccess for ResponseInfo<T, E>
where
    T: Serialize + DeserializeOwned,
{
    fn field(&self, name: &str) -> Result<Value, FieldError> {
        match name {
            "description" => {
                Ok(self.description.clone().map(Value::String).unwrap_or(Value::Null))
            }
            "response" => match &self.response {
                Some(response) => serde_json::to_value(response)
                    .map_err(|e| FieldError::invalid(name, e.to_string())),
                None => Ok(Value::Null),
            },
            other => self
                .extras
                .get(other)
                .cloned()
                .ok_or_else(|| FieldError::missing(other)),
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
        match name {
            "description" => {
                self.description = match value {
                    Value::Null => None,
                    Value::String(s) => Some(s),
                    other => {
                        return Err(FieldError::invalid(
                            name,
                            format!("expected a string, got {}", other),
                        ))
                    }
                };
                Ok(())
            }
            "response" => {
                let typed: T = serde_json::from_value(value)
                    .map_err(|e| FieldError::invalid(name, e.to_string()))?;
                self.response = Some(typed);
                Ok(())
            }
            other => {
                self.extras.insert(other.to_string(), value);
                Ok(())
            }
        }
    }
}

/// Builder for `ResponseInfo`.
pub struct ResponseInfoBuilder<T, E> {
    response: Option<T>,
    description: Option<String>,
    callback: Option<Box<dyn FnMut() -> Result<T, E> + Send>>,
    extract: Option<Arc<dyn Fn(&T) -> T + Send + Sync>>,
    extras: BTreeMap<String, Value>,
}

impl<T, E> Default for ResponseInfoBuilder<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> ResponseInfoBuilder<T, E> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            response: None,
            description: None,
            callback: None,
            extract: None,
            extras: BTreeMap::new(),
        }
    }

    /// Set the initial payload.
    pub fn response(mut self, response: T) -> Self {
        self.response = Some(response);
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach a caller-supplied named attribute.
    pub fn extra(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extras.insert(name.into(), value);
        self
    }

    /// Attach the consume-once payload callback.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut() -> Result<T, E> + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Attach the read-time extractor.
    pub fn extract<F>(mut self, extract: F) -> Self
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        self.extract = Some(Arc::new(extract));
        self
    }

    /// Finish the cell.
    pub fn build(self) -> ResponseInfo<T, E> {
        let callback = match self.callback {
            Some(callback) => CallbackState::Pending(callback),
            None => CallbackState::Absent,
        };
        ResponseInfo {
            response: self.response,
            description: self.description,
            callback,
            extract: self.extract,
            extras: self.extras,
        }
    }
}
