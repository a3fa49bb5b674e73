use chronicler_core::KindFilter;

/// Print the active forge taxonomy so an operator can tell which kinds a
/// report keeps, which it silently ignores, and (by elimination) which
/// would warn as unknown.
pub fn execute() -> anyhow::Result<()> {
    let filter = KindFilter::forge_default();
    println!("keep:");
    for kind in filter.keep_kinds() {
        println!("  {kind}");
    }
    println!("ignore:");
    for kind in filter.ignore_kinds() {
        println!("  {kind}");
    }
    Ok(())
}
