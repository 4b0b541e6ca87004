fn main() {
    std::env::set_var("OUT_DIR", "../api/proto/gen");
    prost_build::Config::new()
        .bytes(["."])
        .compile_protos(
            &[
                // Identity pull protocol, one message per stream
                "../api/proto/identity.proto",
            ],
            &["../api/proto/"],
        )
        .expect("Failed to compile api protobuf protocol files");
}
