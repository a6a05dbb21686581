fn main() {
    // Propagates the ESP-IDF build environment when cross-compiling for the
    // espidf target; emits nothing on host builds.
    embuild::espidf::sysenv::output();
}
