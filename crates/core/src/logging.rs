use std::panic::PanicHookInfo;
use std::sync::Once;

use tracing_subscriber::{filter::FilterFn, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the `tracing` subscriber for busline crates. Safe to call repeatedly;
/// only the first call has an effect. Hosts that bring their own subscriber
/// should not call this.
pub fn init_logging() {
    static LOGGING_SETUP: Once = Once::new();

    LOGGING_SETUP.call_once(|| {
        let filter =
            FilterFn::new(|meta| meta.module_path().unwrap_or_default().starts_with("busline"));
        let layer = tracing_subscriber::fmt::layer().with_target(true);

        // Another subscriber may already be global (test harness, host app).
        if tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()
            .is_ok()
        {
            let previous = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                panic_hook(info);
                previous(info);
            }));
        }
    })
}

fn panic_hook(info: &PanicHookInfo) {
    tracing::error!("{info}")
}
