fn main() {
    let protoc_path =
        protoc_bin_vendored::protoc_bin_path().expect("failed to find bundled protoc");
    std::env::set_var("PROTOC", protoc_path);

    println!("cargo:rerun-if-changed=proto");
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile(
            &[
                "proto/bio/net.proto",
                "proto/bio/route.proto",
                "proto/bio/ris.proto",
            ],
            &["proto"],
        )
        .expect("failed to compile BioRIS gRPC definitions");
}
