//! Human-readable progress lines on stdout, plus per-unit buffering

use super::{ProgressEvent, ProgressHandler};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Renders an event as the line shown to the user, if it has one.
pub fn render_line(event: &ProgressEvent) -> Option<String> {
    match event {
        ProgressEvent::UnitStarted { unit, operation } => {
            Some(format!("==> {} {}", operation.verb(), unit))
        }
        ProgressEvent::StageStarted { unit, stage } => Some(format!("  [{}] {}", unit, stage)),
        ProgressEvent::Note { unit, message } => Some(format!("  [{}] {}", unit, message)),
        ProgressEvent::Warning { unit, message } if unit.is_empty() => {
            Some(format!("warning: {}", message))
        }
        ProgressEvent::Warning { unit, message } => {
            Some(format!("  [{}] warning: {}", unit, message))
        }
        ProgressEvent::UnitFinished {
            unit,
            operation,
            success: true,
            duration,
            ..
        } => Some(format!(
            "[OK] {} {} ({:.2}s)",
            operation.as_str(),
            unit,
            duration.as_secs_f64()
        )),
        ProgressEvent::UnitFinished {
            unit,
            operation,
            success: false,
            detail,
            ..
        } => Some(format!("[FAILED] {} {}: {}", operation.as_str(), unit, detail)),
        ProgressEvent::EmitterComplete { emitter, files } => {
            Some(format!("[OK] {}: {} file(s) written", emitter, files))
        }
        _ => None,
    }
}

/// Prints progress lines to stdout. In quiet mode only warnings and failures are shown.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleHandler {
    quiet: bool,
}

impl ConsoleHandler {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    fn visible(&self, event: &ProgressEvent) -> bool {
        !self.quiet
            || matches!(
                event,
                ProgressEvent::Warning { .. } | ProgressEvent::UnitFinished { success: false, .. }
            )
    }
}

impl ProgressHandler for ConsoleHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        self.on_batch(std::slice::from_ref(event));
    }

    fn on_batch(&self, events: &[ProgressEvent]) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for event in events.iter().filter(|e| self.visible(e)) {
            if let Some(line) = render_line(event) {
                let _ = writeln!(out, "{}", line);
            }
        }
        let _ = out.flush();
    }
}

/// Forwards every event to several handlers
pub struct FanoutHandler {
    handlers: Vec<Arc<dyn ProgressHandler>>,
}

impl FanoutHandler {
    pub fn new(handlers: Vec<Arc<dyn ProgressHandler>>) -> Self {
        Self { handlers }
    }
}

impl ProgressHandler for FanoutHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        for handler in &self.handlers {
            handler.on_progress(event);
        }
    }

    fn on_batch(&self, events: &[ProgressEvent]) {
        for handler in &self.handlers {
            handler.on_batch(events);
        }
    }
}

/// Holds one unit's events and replays them to `target` as a single batch, so output
/// from parallel builds stays contiguous per unit.
pub struct BufferedHandler {
    target: Arc<dyn ProgressHandler>,
    events: Mutex<Vec<ProgressEvent>>,
}

impl BufferedHandler {
    pub fn new(target: Arc<dyn ProgressHandler>) -> Self {
        Self {
            target,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn flush(&self) {
        let events = match self.events.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        if !events.is_empty() {
            self.target.on_batch(&events);
        }
    }
}

impl ProgressHandler for BufferedHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

impl Drop for BufferedHandler {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::Operation;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingHandler {
        batches: Mutex<Vec<Vec<String>>>,
    }

    impl ProgressHandler for RecordingHandler {
        fn on_progress(&self, event: &ProgressEvent) {
            self.on_batch(std::slice::from_ref(event));
        }

        fn on_batch(&self, events: &[ProgressEvent]) {
            let lines = events.iter().filter_map(render_line).collect();
            self.batches.lock().unwrap().push(lines);
        }
    }

    fn started(unit: &str) -> ProgressEvent {
        ProgressEvent::UnitStarted {
            unit: unit.to_string(),
            operation: Operation::Build,
        }
    }

    #[test]
    fn test_render_lines() {
        assert_eq!(render_line(&started("A")).unwrap(), "==> Building A");

        let failed = ProgressEvent::UnitFinished {
            unit: "A".to_string(),
            operation: Operation::Build,
            success: false,
            duration: Duration::ZERO,
            detail: "Linking Build/A failed: exit 1".to_string(),
        };
        assert_eq!(
            render_line(&failed).unwrap(),
            "[FAILED] build A: Linking Build/A failed: exit 1"
        );

        let global = ProgressEvent::Warning {
            unit: String::new(),
            message: "duplicate".to_string(),
        };
        assert_eq!(render_line(&global).unwrap(), "warning: duplicate");

        assert!(render_line(&ProgressEvent::DiscoveryStarted { roots: 1 }).is_none());
    }

    #[test]
    fn test_buffered_handler_replays_as_one_batch() {
        let target = Arc::new(RecordingHandler::default());
        let buffered = BufferedHandler::new(target.clone());

        buffered.on_progress(&started("A"));
        buffered.on_progress(&ProgressEvent::StageStarted {
            unit: "A".to_string(),
            stage: "Compile".to_string(),
        });
        assert!(target.batches.lock().unwrap().is_empty());

        buffered.flush();
        let batches = target.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec!["==> Building A", "  [A] Compile"]);
    }

    #[test]
    fn test_buffered_handler_flushes_on_drop() {
        let target = Arc::new(RecordingHandler::default());
        {
            let buffered = BufferedHandler::new(target.clone());
            buffered.on_progress(&started("B"));
        }
        assert_eq!(target.batches.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_quiet_console_hides_progress() {
        let console = ConsoleHandler::new(true);
        assert!(!console.visible(&started("A")));
        assert!(console.visible(&ProgressEvent::Warning {
            unit: "A".to_string(),
            message: "x".to_string(),
        }));
    }
}
