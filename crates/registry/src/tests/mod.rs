mod families;
mod lifecycle;

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
