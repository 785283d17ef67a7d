//! Utilities for publishing Kubernetes events and for classifying reconciler errors.

use std::error::Error;

use kube::runtime::{
    controller,
    events::{Event, EventType, Recorder, Reporter},
    reflector::ObjectRef,
};
use tracing::Instrument;

/// Implemented by reconciler error types so they can be turned into Kubernetes events and
/// attributed to the object that caused them.
pub trait ReconcilerError: Error {
    /// A short, machine-readable category for the error, usually the name of the top-level
    /// enum variant. Used as the Kubernetes event's `reason`.
    fn category(&self) -> &'static str;

    /// The object the error should be attributed to, if it isn't the primary object being
    /// reconciled (for example, a `Binding` owned by the `Placement` being reconciled).
    fn secondary_object(&self) -> Option<ObjectRef<kube::core::DynamicObject>> {
        None
    }
}

/// Converts an [`Error`] into a publishable Kubernetes [`Event`]
fn error_to_event<E: ReconcilerError>(err: &E) -> Event {
    // Walk the whole error chain, so that we get all the full reason for the error
    let mut full_msg = {
        use std::fmt::Write;
        let mut buf = err.to_string();
        let mut err: &dyn Error = err;
        loop {
            err = match err.source() {
                Some(err) => {
                    write!(buf, ": {err}").unwrap();
                    err
                }
                None => break buf,
            }
        }
    };
    message::truncate_with_ellipsis(&mut full_msg, 1024);
    Event {
        type_: EventType::Warning,
        reason: err.category().to_string(),
        note: Some(full_msg),
        action: "Reconcile".to_string(),
        secondary: err.secondary_object().map(|secondary| secondary.into()),
    }
}

/// Reports an error coming from a controller to Kubernetes
///
/// This is intended to be executed on the log entries returned by
/// [`kube::runtime::Controller::run`].
#[tracing::instrument(skip(client))]
pub fn publish_controller_error_as_k8s_event<ReconcileErr, QueueErr>(
    client: &kube::Client,
    controller: &str,
    controller_error: &controller::Error<ReconcileErr, QueueErr>,
) where
    ReconcileErr: ReconcilerError,
    QueueErr: Error,
{
    let (error, obj) = match controller_error {
        controller::Error::ReconcilerFailed(err, obj) => (err, obj),
        // Other error types are intended for the operator administrator, and aren't linked to a specific object
        _ => return,
    };
    let recorder = Recorder::new(
        client.clone(),
        Reporter {
            controller: controller.to_string(),
            instance: None,
        },
        obj.clone().into(),
    );
    let event = error_to_event(error);
    // Run in the background
    tokio::spawn(
        async move {
            if let Err(err) = recorder.publish(event).await {
                tracing::error!(
                    error = &err as &dyn std::error::Error,
                    "Failed to report error as K8s event"
                );
            }
        }
        .in_current_span(),
    );
}

mod message {
    /// Ensures that `msg` is at most `max_len` _bytes_ long
    ///
    /// If `msg` is longer than `max_len` then the extra text is replaced with an ellipsis.
    pub fn truncate_with_ellipsis(msg: &mut String, max_len: usize) {
        const ELLIPSIS: char = '…';
        const ELLIPSIS_LEN: usize = ELLIPSIS.len_utf8();
        let len = msg.len();
        if len > max_len {
            let start_of_trunc_char = find_start_of_char(msg, max_len.saturating_sub(ELLIPSIS_LEN));
            msg.truncate(start_of_trunc_char);
            if ELLIPSIS_LEN <= max_len {
                msg.push(ELLIPSIS);
            }
        }
        debug_assert!(msg.len() <= max_len);
    }

    fn find_start_of_char(s: &str, mut pos: usize) -> usize {
        loop {
            if s.is_char_boundary(pos) {
                break pos;
            }
            pos -= 1;
        }
    }

    #[cfg(test)]
    mod tests {
        use crate::logging::k8s_events::message::find_start_of_char;

        use super::truncate_with_ellipsis;

        #[test]
        fn truncate_should_be_noop_if_string_fits() {
            let mut x = "hello".to_string();
            truncate_with_ellipsis(&mut x, 5);
            assert_eq!(&x, "hello");
        }

        #[test]
        fn truncate_should_ellipsize_large_string() {
            let mut x = "hello".to_string();
            truncate_with_ellipsis(&mut x, 4);
            assert_eq!(&x, "h…");
            x = "hello, this is a much larger string".to_string();
            truncate_with_ellipsis(&mut x, 4);
            assert_eq!(&x, "h…");
        }

        #[test]
        fn truncate_should_ellipsize_emoji() {
            let mut x = "hello🙋".to_string();
            truncate_with_ellipsis(&mut x, 8);
            assert_eq!(&x, "hello…");
        }

        #[test]
        fn find_start_of_char_should_be_noop_for_ascii() {
            assert_eq!(find_start_of_char("hello", 2 /* l */), 2);
        }

        #[test]
        fn find_start_of_char_should_find_start_of_emoji() {
            assert_eq!(
                find_start_of_char("hello🙋", 7 /* in the middle of the emoji */),
                5
            );
        }
    }
}
