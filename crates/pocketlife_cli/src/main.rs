//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `pocketlife_core` linkage and
//!   the bootstrap-edit-flush loop outside the Flutter runtime.

use pocketlife_core::{AppContext, MemoryAdapter};

fn main() {
    println!("pocketlife_core ping={}", pocketlife_core::ping());
    println!("pocketlife_core version={}", pocketlife_core::core_version());

    let ctx = AppContext::bootstrap(MemoryAdapter::new());
    match ctx.workspace().create_note("smoke", "created from the cli probe", None) {
        Ok(note) => println!("created note id={}", note.id),
        Err(err) => eprintln!("create_note failed: {err}"),
    }
    println!("dirty={}", ctx.binder().is_dirty());
    ctx.shutdown();
}
