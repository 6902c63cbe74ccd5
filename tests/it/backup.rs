use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use argtree::{host_flag, no_ssl_verify_flag, password_flag, username_flag, Cli, Command, Flag};

pub(crate) type Log = Rc<RefCell<Vec<String>>>;

pub(crate) const MAN_PATH: &str = "/nonexistent/argtree/man";

/// A backup tool with a few levels of commands. Actions record what they saw
/// in the returned log.
pub(crate) fn cli() -> (Cli, Log) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let mut cli = Cli::new("cbbackup", "Couchbase backup and restore");
    cli.set_man_path(MAN_PATH);

    cli.add_command(config(&log));
    cli.add_command(list(&log));
    cli.add_command(repo(&log));

    let mut secret = Command::new("secret", "Dump internal state");
    secret.set_hidden(true);
    let (flag, all) = Flag::bool(false).long("all").build();
    secret.add_flag(flag);
    secret.set_action(record(&log, move || format!("secret all={}", all.get())));
    cli.add_command(secret);

    cli.add_command(Command::manual("topics", "Show the backup topics guide", "cbbackup-topics.7"));

    (cli, log)
}

fn config(log: &Log) -> Command {
    let mut cmd = Command::new("config", "Create a new backup configuration");
    cmd.set_man_page("cbbackup-config.1");

    let (flag, cluster) = host_flag("").required().build();
    cmd.add_flag(flag);
    let (flag, username) = username_flag("").required().build();
    cmd.add_flag(flag);
    let (flag, password) = password_flag("").required().build();
    cmd.add_flag(flag);
    let (flag, archive) = Flag::string("")
        .short("a")
        .long("archive")
        .env("CB_ARCHIVE")
        .deprecated(&["dir"])
        .desc("The archive directory to store backups in")
        .required()
        .build();
    cmd.add_flag(flag);
    let (flag, threads) = Flag::int(4)
        .short("t")
        .long("threads")
        .env("CB_THREADS")
        .desc("The number of threads to use when transferring data, defaults to four")
        .build();
    cmd.add_flag(flag);
    let (flag, vbuckets) = Flag::int_list(Vec::new())
        .long("vbuckets")
        .desc("Comma separated list of vBuckets to back up")
        .build();
    cmd.add_flag(flag);
    let (flag, mappings) = Flag::string_map(BTreeMap::new())
        .long("map-data")
        .desc("Bucket remappings as source=target pairs")
        .build();
    cmd.add_flag(flag);
    let (flag, no_ssl_verify) = no_ssl_verify_flag().build();
    cmd.add_flag(flag);
    let (flag, _internal) = Flag::bool(false).long("internal").hidden().build();
    cmd.add_flag(flag);

    cmd.set_action(record(log, move || {
        format!(
            "config cluster={} username={} password={} archive={} threads={} vbuckets={:?} \
             map-data={:?} no-ssl-verify={}",
            cluster.get(),
            username.get(),
            password.get(),
            archive.get(),
            threads.get(),
            vbuckets.get(),
            mappings.get(),
            no_ssl_verify.get(),
        )
    }));
    cmd
}

fn list(log: &Log) -> Command {
    let mut cmd = Command::new("list", "List the backups in an archive");
    let (flag, archive) = Flag::string("")
        .short("a")
        .long("archive")
        .desc("The archive directory")
        .required()
        .build();
    cmd.add_flag(flag);
    cmd.set_action(record(log, move || format!("list archive={}", archive.get())));
    cmd
}

fn repo(log: &Log) -> Command {
    let mut cmd = Command::new("repo", "Manage repositories");

    let mut create = Command::new("create", "Create a repository");
    let (flag, name) =
        Flag::string("").short("n").long("name").desc("Repository name").required().build();
    create.add_flag(flag);
    create.set_action(record(log, move || format!("repo create name={}", name.get())));
    cmd.add_command(create);

    let mut remove = Command::new("remove", "Remove a repository");
    let (flag, force) = Flag::bool(false).long("force").desc("Skip confirmation").build();
    remove.add_flag(flag);
    remove.set_action(record(log, move || format!("repo remove force={}", force.get())));
    cmd.add_command(remove);

    cmd
}

fn record(log: &Log, f: impl Fn() -> String + 'static) -> impl FnMut() + 'static {
    let log = Rc::clone(log);
    move || log.borrow_mut().push(f())
}
