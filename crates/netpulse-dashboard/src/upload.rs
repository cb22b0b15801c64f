//! Asynchronous text reads for uploaded CSV files.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Read `file` as text and hand the result to `on_done`.
///
/// The FileReader fires its events after the current task, so the handler
/// can be attached after the read is started.
pub fn read_text(file: &web_sys::File, on_done: impl FnOnce(Result<String, String>) + 'static) {
    let reader = match web_sys::FileReader::new() {
        Ok(reader) => reader,
        Err(_) => return on_done(Err("file reader unavailable".into())),
    };
    if reader.read_as_text(file).is_err() {
        return on_done(Err("could not start reading the file".into()));
    }

    let result_source = reader.clone();
    let callback = Closure::once(move |_event: web_sys::ProgressEvent| {
        let outcome = result_source
            .result()
            .ok()
            .and_then(|value| value.as_string())
            .ok_or_else(|| "file could not be read as text".to_string());
        on_done(outcome);
    });
    reader.set_onloadend(Some(callback.as_ref().unchecked_ref()));
    // Keep the closure alive until the event fires.
    callback.forget();
}
