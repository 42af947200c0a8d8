#[cfg(feature = "csr")]
fn main() {
    taskboard_web::mount();
}

#[cfg(not(feature = "csr"))]
fn main() {
    // Only meaningful in the browser build: `trunk serve` enables `csr`
}
