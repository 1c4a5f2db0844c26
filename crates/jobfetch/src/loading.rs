#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadingEvent {
    Started { message: String },
    MessageChanged { message: String },
    Stopped,
}

type Observer = Box<dyn FnMut(&LoadingEvent)>;

/// Loading indicator state with subscribed observers.
///
/// Visibility changes (`Started` / `Stopped`) always reach observers.
/// Message updates only do once the state has been attached to a display.
pub struct LoadingState {
    is_loading: bool,
    message: String,
    attached: bool,
    observers: Vec<Observer>,
}

impl LoadingState {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            is_loading: false,
            message: message.into(),
            attached: false,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&LoadingEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        let message = message.into();
        if message == self.message {
            return;
        }
        self.message = message;
        if self.attached {
            self.notify(LoadingEvent::MessageChanged {
                message: self.message.clone(),
            });
        }
    }

    pub fn start(&mut self, message: Option<&str>) {
        if let Some(message) = message.filter(|m| !m.is_empty()) {
            self.set_message(message);
        }
        if !self.is_loading {
            self.is_loading = true;
            self.notify(LoadingEvent::Started {
                message: self.message.clone(),
            });
        }
    }

    pub fn stop(&mut self) {
        if self.is_loading {
            self.is_loading = false;
            self.notify(LoadingEvent::Stopped);
        }
    }

    fn notify(&mut self, event: LoadingEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }
}
