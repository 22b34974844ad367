#![forbid(unsafe_code)]

//! Attach-time diagnostics: warnings for rejected declarations, the attach
//! report, and the `attrsync.attach` span.

use std::rc::Rc;
use std::sync::{Arc, Mutex};

use attrsync_core::{
    AttachError, AttrValue, AttributeDecl, ConfigError, ObserverOptions, Tick, attach_observer,
};
use attrsync_host::{Element, HeadlessHost, Host, MemoryHost};
use attrsync_reactive::Observable;
use pretty_assertions::assert_eq;
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

#[derive(Default)]
struct CaptureState {
    events: Vec<(tracing::Level, String)>,
    saw_attach_span: bool,
    recorded_bindings: Option<u64>,
}

impl CaptureState {
    fn warnings(&self) -> Vec<String> {
        self.events
            .iter()
            .filter(|(level, _)| *level == tracing::Level::WARN)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

struct Capture {
    state: Arc<Mutex<CaptureState>>,
}

impl<S> Layer<S> for Capture
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::Id,
        _ctx: Context<'_, S>,
    ) {
        if attrs.metadata().name() == "attrsync.attach" {
            self.state.lock().expect("capture lock").saw_attach_span = true;
        }
    }

    fn on_record(&self, id: &tracing::Id, values: &tracing::span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        if span.metadata().name() != "attrsync.attach" {
            return;
        }
        struct Bindings(Option<u64>);
        impl tracing::field::Visit for Bindings {
            fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
                if field.name() == "bindings" {
                    self.0 = Some(value);
                }
            }

            fn record_debug(&mut self, _field: &tracing::field::Field, _value: &dyn std::fmt::Debug) {
            }
        }
        let mut visitor = Bindings(None);
        values.record(&mut visitor);
        if let Some(count) = visitor.0 {
            self.state.lock().expect("capture lock").recorded_bindings = Some(count);
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        struct Msg {
            message: Option<String>,
        }
        impl tracing::field::Visit for Msg {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                if field.name() == "message" {
                    self.message = Some(value.to_string());
                }
            }

            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.message = Some(format!("{value:?}").trim_matches('"').to_string());
                }
            }
        }
        let mut msg = Msg { message: None };
        event.record(&mut msg);
        self.state
            .lock()
            .expect("capture lock")
            .events
            .push((*event.metadata().level(), msg.message.unwrap_or_default()));
    }
}

fn capture() -> (Arc<Mutex<CaptureState>>, tracing::subscriber::DefaultGuard) {
    let state = Arc::new(Mutex::new(CaptureState::default()));
    let subscriber = tracing_subscriber::registry().with(Capture {
        state: Arc::clone(&state),
    });
    (state, tracing::subscriber::set_default(subscriber))
}

#[test]
fn rejected_declarations_warn_and_the_rest_still_sync() {
    let (state, _guard) = capture();
    let dom = MemoryHost::new();
    let element = dom.create_element();
    let title = Observable::new(AttrValue::from("kept"));
    let dup = Observable::new(AttrValue::from("winner"));
    let host: Rc<dyn Host> = Rc::new(dom.clone());

    let handle = attach_observer(
        host,
        Some(element.clone()),
        ObserverOptions::new()
            .attribute(AttributeDecl::empty().with_cell(&title))
            .attribute(AttributeDecl::named("orphan"))
            .attribute(AttributeDecl::new("title", &title))
            .attribute(AttributeDecl::new("title", &dup))
            .tick(Tick::Before),
    );

    assert_eq!(
        handle.report().issues,
        vec![
            ConfigError::MissingName { index: 0 },
            ConfigError::MissingCell {
                attribute: "orphan".to_string()
            },
            ConfigError::DuplicateAttribute {
                attribute: "title".to_string()
            },
        ]
    );
    assert!(handle.report().is_active());
    assert_eq!(handle.attributes(), vec!["title"]);
    assert_eq!(element.get_attribute("title").as_deref(), Some("winner"));

    let snapshot = state.lock().expect("capture lock");
    assert_eq!(
        snapshot.warnings(),
        vec![
            "attribute declaration without a name skipped",
            "attribute declaration without a cell skipped",
            "duplicate attribute declaration; last one wins",
        ]
    );
    assert!(snapshot.saw_attach_span, "expected attrsync.attach span");
    assert_eq!(snapshot.recorded_bindings, Some(1));
}

#[test]
fn missing_element_warns_once() {
    let (state, _guard) = capture();
    let dom = MemoryHost::new();
    let cell = Observable::new(AttrValue::Null);
    let host: Rc<dyn Host> = Rc::new(dom);

    let handle = attach_observer(
        host,
        None,
        ObserverOptions::new().attribute(AttributeDecl::new("title", &cell)),
    );

    assert_eq!(handle.report().inert, Some(AttachError::MissingElement));
    assert_eq!(
        state.lock().expect("capture lock").warnings(),
        vec!["attribute observer attached without an element"]
    );
}

#[test]
fn headless_host_is_quiet() {
    let (state, _guard) = capture();
    let dom = MemoryHost::new();
    let element: Rc<dyn Element> = dom.create_element();
    let cell = Observable::new(AttrValue::from("x"));

    let handle = attach_observer(
        Rc::new(HeadlessHost),
        Some(element),
        ObserverOptions::new().attribute(AttributeDecl::new("title", &cell)),
    );

    assert!(!handle.is_attached());
    assert!(state.lock().expect("capture lock").warnings().is_empty());
}
