use std::io::Write;
use std::sync::{Mutex, MutexGuard};

use crate::bridge::logger::LOGGER;

/// Where a submission's prompt is read from when Enter is pressed.
pub trait PromptSource: Sync {
    fn prompt(&self) -> String;
}

impl PromptSource for str {
    fn prompt(&self) -> String {
        self.to_string()
    }
}

impl PromptSource for String {
    fn prompt(&self) -> String {
        self.clone()
    }
}

/// Where interim and final text is displayed. Each call replaces the previous text.
pub trait OutputSurface: Send + Sync {
    fn set_text(&self, text: &str);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poison| poison.into_inner())
}

/// Editable text field.
#[derive(Debug, Default)]
pub struct InputField {
    value: Mutex<String>,
}

impl InputField {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(value.into()),
        }
    }

    pub fn set_value(&self, value: impl Into<String>) {
        *lock(&self.value) = value.into();
    }

    pub fn value(&self) -> String {
        lock(&self.value).clone()
    }
}

impl PromptSource for InputField {
    fn prompt(&self) -> String {
        self.value()
    }
}

/// Output surface that records every write.
#[derive(Debug, Default)]
pub struct MemoryOutput {
    writes: Mutex<Vec<String>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently displayed text, empty when nothing was written yet.
    pub fn text(&self) -> String {
        lock(&self.writes).last().cloned().unwrap_or_default()
    }

    pub fn writes(&self) -> Vec<String> {
        lock(&self.writes).clone()
    }
}

impl OutputSurface for MemoryOutput {
    fn set_text(&self, text: &str) {
        lock(&self.writes).push(text.to_string());
    }
}

/// Output surface printing each text on its own line.
#[derive(Debug)]
pub struct WriterOutput<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl<W: Write + Send> OutputSurface for WriterOutput<W> {
    fn set_text(&self, text: &str) {
        let mut writer = lock(&self.writer);
        if let Err(err) = writeln!(writer, "{text}").and_then(|_| writer.flush()) {
            LOGGER.warn(format!("failed to write output: {err}"));
        }
    }
}
