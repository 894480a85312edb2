pub fn setup() {
    // panic reports go through color-backtrace, installed before anything
    // else can fail
    color_backtrace::install();
}
