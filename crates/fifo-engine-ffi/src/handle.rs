use fifo_engine_core::Engine;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

lazy_static! {
    static ref HANDLES: Mutex<HashMap<u64, Box<Engine>>> = Mutex::new(HashMap::new());
}

pub fn allocate_handle(engine: Engine) -> u64 {
    let handle = NEXT_HANDLE.fetch_add(1, Ordering::SeqCst);
    let mut handles = HANDLES.lock().unwrap();
    handles.insert(handle, Box::new(engine));
    handle
}

pub fn with_handle<F, R>(handle: u64, f: F) -> Option<R>
where
    F: FnOnce(&Engine) -> R,
{
    let handles = HANDLES.lock().unwrap();
    handles.get(&handle).map(|engine| f(engine))
}

pub fn destroy_handle(handle: u64) -> bool {
    let engine = {
        let mut handles = HANDLES.lock().unwrap();
        handles.remove(&handle)
    };
    match engine {
        Some(engine) => {
            // Joins the scheduler worker outside the handle-table lock.
            engine.shutdown();
            true
        }
        None => false,
    }
}
