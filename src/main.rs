use daqflow::app;

fn main() {
    app::startup::startup();
}
