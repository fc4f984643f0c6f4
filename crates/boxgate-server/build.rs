fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_file = "proto/boxgate.proto";

    // Recompile if proto file changes
    println!("cargo:rerun-if-changed={}", proto_file);

    let out_dir = std::path::PathBuf::from(std::env::var("OUT_DIR")?);

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(out_dir.join("boxgate_descriptor.bin"))
        .compile_protos(&[proto_file], &["proto"])?;

    Ok(())
}
