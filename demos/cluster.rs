use argtree::{
    ca_cert_flag, host_flag, no_ssl_verify_flag, password_flag, username_flag, Cli, Command, Flag,
};

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut cli = Cli::new("cluster", "Manage a Couchbase cluster");
    cli.set_man_path(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/man"));

    let mut info = Command::new("info", "Show cluster information");
    let (flag, host) = host_flag("").required().build();
    info.add_flag(flag);
    let (flag, username) = username_flag("").required().build();
    info.add_flag(flag);
    let (flag, password) = password_flag("").required().build();
    info.add_flag(flag);
    let (flag, ca_cert) = ca_cert_flag("").build();
    info.add_flag(flag);
    let (flag, no_ssl_verify) = no_ssl_verify_flag().build();
    info.add_flag(flag);
    let (flag, buckets) = Flag::int_list(Vec::new())
        .short("b")
        .long("bucket-ids")
        .deprecated(&["ids"])
        .desc("Restricts the report to these bucket ids")
        .build();
    info.add_flag(flag);
    info.set_action(move || {
        println!("cluster:   {}", host.get());
        println!("username:  {}", username.get());
        println!("password:  {}", "*".repeat(password.get().len()));
        println!("cacert:    {}", ca_cert.get());
        println!("ssl check: {}", !no_ssl_verify.get());
        println!("buckets:   {}", buckets.text());
    });
    cli.add_command(info);

    cli.add_command(Command::manual("guide", "Read the getting started guide", "cluster-guide.7"));

    cli.run().into()
}
