//! Raw JNI export.
//!
//! Matches `external fun runPythonScript(): String` declared on
//! `com.example.myapp.MainActivity`, so an existing app can swap its native
//! library without touching Kotlin code.

use jni::JNIEnv;
use jni::objects::JObject;
use jni::sys::jstring;
use tracing::error;

use crate::global;

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_example_myapp_MainActivity_runPythonScript<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
) -> jstring {
    let text = global::invoke_guarded();
    match env.new_string(&text) {
        Ok(string) => string.into_raw(),
        Err(err) => {
            // A pending Java exception (usually OOM) is reported by the VM.
            error!(error = %err, "could not allocate result string");
            std::ptr::null_mut()
        }
    }
}
