//! Emission of a `Configuration` as C source for an SOEM application.
//!
//! Declarations are written in dependency order so every name is defined
//! before it is referenced: per slave the CoE data buffer and the CoE
//! command table, then the slave table, then the `ec_eni` record.

use std::io;

use log::{info, trace};

use crate::cgen::CGen;
use crate::config::{CoEInitCommand, Configuration, SlaveConfig};
use crate::Args;

const NULL: &str = "NULL";

/// `(count, name)` of an emitted table; `name` is `NULL` for empty tables.
type TableRef = (usize, String);

/// Render the transition mask, e.g. `(ECT_ESMTRANS_PS | ECT_ESMTRANS_SP)`.
pub fn transition_expr(transitions: &[String]) -> String {
    let names: Vec<String> = transitions.iter().map(|t| format!("ECT_ESMTRANS_{}", t)).collect();
    if names.len() > 1 {
        format!("({})", names.join(" | "))
    } else {
        names.concat()
    }
}

/// Emit the concatenated data of all commands of one slave and return, per
/// command, its data size and a pointer expression into the buffer.
fn gen_coe_data<W: io::Write>(
    cg: &mut CGen<W>,
    slave: u16,
    cmds: &[CoEInitCommand],
) -> io::Result<Vec<TableRef>> {
    let name = format!("s{}_coeData", slave);
    let size: usize = cmds.iter().map(|c| c.data.len()).sum();
    if size > 0 {
        trace!("Emitting {}[{}]", name, size);
        cg.open(Some(&format!("static uint8 {}[{}]", name, size)), 1)?;
        for c in cmds.iter().filter(|c| !c.data.is_empty()) {
            let bytes: Vec<String> = c.data.iter().map(|b| b.to_string()).collect();
            cg.line(&bytes.join(", "))?;
        }
        cg.close(1)?;
    }

    let mut offset = 0;
    Ok(cmds
        .iter()
        .map(|c| {
            let len = c.data.len();
            if len > 0 {
                let data = (len, format!("({} + {})", name, offset));
                offset += len;
                data
            } else {
                (0, NULL.to_string())
            }
        })
        .collect())
}

fn gen_coe_cmd<W: io::Write>(
    cg: &mut CGen<W>,
    cmd: &CoEInitCommand,
    data: &TableRef,
) -> io::Result<()> {
    let (data_size, data) = data;
    cg.open(None, 1)?;
    if !cmd.comment.trim().is_empty() {
        cg.comment(&cmd.comment)?;
    }
    cg.line(&format!(".Transition = {}", transition_expr(&cmd.transitions)))?;
    cg.line(&format!(".CA = {}", if cmd.complete_access { "TRUE" } else { "FALSE" }))?;
    cg.line(&format!(".Ccs = {}", cmd.ccs))?;
    cg.line(&format!(".Index = 0x{:04X}", cmd.index))?;
    cg.line(&format!(".SubIdx = {}", cmd.sub_index))?;
    cg.line(&format!(".Timeout = {}", cmd.timeout))?;
    cg.line(&format!(".DataSize = {}", data_size))?;
    cg.line(&format!(".Data = {}", data))?;
    cg.close(1)
}

/// Emit the CoE command table of one slave, preceded by its data buffer.
fn gen_coe_cmds<W: io::Write>(cg: &mut CGen<W>, slave: &SlaveConfig) -> io::Result<TableRef> {
    let count = slave.coe_cmds.len();
    if count == 0 {
        info!("Slave {} has no CoE init commands; leaving it out of the slave table", slave.slave);
        return Ok((0, NULL.to_string()));
    }

    let name = format!("s{}_coeCmds", slave.slave);
    let coe_data = gen_coe_data(cg, slave.slave, &slave.coe_cmds)?;
    trace!("Emitting {}[{}]", name, count);
    cg.open(Some(&format!("static ec_enicoecmdt {}[{}]", name, count)), 1)?;
    for (cmd, data) in slave.coe_cmds.iter().zip(coe_data.iter()) {
        gen_coe_cmd(cg, cmd, data)?;
    }
    cg.close(1)?;
    Ok((count, name))
}

/// Emit the per-slave tables and the slave table; `slaves` must be sorted.
fn gen_slaves<W: io::Write>(cg: &mut CGen<W>, slaves: &[&SlaveConfig]) -> io::Result<TableRef> {
    let coe_list = slaves
        .iter()
        .map(|s| gen_coe_cmds(cg, s))
        .collect::<io::Result<Vec<_>>>()?;

    let count = coe_list.iter().filter(|(n, _)| *n > 0).count();
    if count == 0 {
        return Ok((0, NULL.to_string()));
    }

    let name = "eniSlave".to_string();
    trace!("Emitting {}[{}]", name, count);
    cg.open(Some(&format!("static ec_enislavet {}[{}]", name, count)), 1)?;
    for (s, (cmd_count, cmds)) in slaves.iter().zip(coe_list.iter()) {
        if *cmd_count == 0 {
            continue;
        }
        cg.open(None, 1)?;
        cg.line(&format!(".Slave = {}", s.slave))?;
        cg.line(&format!(".VendorId = {}", s.vendor_id))?;
        cg.line(&format!(".ProductCode = {}", s.product_code))?;
        cg.line(&format!(".RevisionNo = {}", s.revision_no))?;
        cg.line(&format!(".CoECmds = {}", cmds))?;
        cg.line(&format!(".CoECmdCount = {}", cmd_count))?;
        cg.close(1)?;
    }
    cg.close(1)?;
    Ok((count, name))
}

fn gen_config<W: io::Write>(cg: &mut CGen<W>, config: &Configuration) -> io::Result<()> {
    let mut slaves: Vec<&SlaveConfig> = config.slaves.iter().collect();
    slaves.sort_by_key(|s| s.slave);

    let (slave_count, slave) = gen_slaves(cg, &slaves)?;
    trace!("Emitting ec_eni with {} slave(s)", slave_count);
    cg.open(Some("ec_enit ec_eni"), 1)?;
    cg.line(&format!(".slave = {}", slave))?;
    cg.line(&format!(".slavecount = {}", slave_count))?;
    cg.close(1)
}

/// Write the complete C file for `config` to `fout`.
pub fn generate<W: io::Write>(args: &Args, config: &Configuration, fout: W) -> io::Result<()> {
    let mut cg = CGen::new(fout, 3);
    cg.directive(&format!("include \"{}\"", args.include))?;
    gen_config(&mut cg, config)?;
    cg.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(transitions: &[&str], data: &[u8]) -> CoEInitCommand {
        CoEInitCommand {
            comment: String::new(),
            transitions: transitions.iter().map(|t| t.to_string()).collect(),
            complete_access: false,
            ccs: 2,
            index: 0x1c12,
            sub_index: 0,
            timeout: 5000,
            data: data.to_vec(),
        }
    }

    fn slave(id: u16, cmds: Vec<CoEInitCommand>) -> SlaveConfig {
        SlaveConfig {
            slave: id,
            vendor_id: 2,
            product_code: 0x1234,
            revision_no: 1,
            coe_cmds: cmds,
        }
    }

    fn render(config: &Configuration) -> String {
        let mut out = Vec::new();
        generate(&Args::default(), config, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_transition_expr() {
        assert_eq!(transition_expr(&["PS".to_string()]), "ECT_ESMTRANS_PS");
        assert_eq!(
            transition_expr(&["PS".to_string(), "SP".to_string()]),
            "(ECT_ESMTRANS_PS | ECT_ESMTRANS_SP)"
        );
    }

    #[test]
    fn test_empty_configuration() {
        let out = render(&Configuration::default());
        assert_eq!(
            out,
            "#include \"soem/soem.h\"\n\n\
             ec_enit ec_eni = {\n   .slave = NULL,\n   .slavecount = 0\n};\n\n"
        );
    }

    #[test]
    fn test_slaves_without_commands_are_left_out() {
        let config = Configuration {
            slaves: vec![slave(1, vec![]), slave(2, vec![])],
        };
        let out = render(&config);
        assert!(!out.contains("eniSlave"));
        assert!(out.contains(".slavecount = 0"));
    }

    #[test]
    fn test_data_offsets() {
        let config = Configuration {
            slaves: vec![slave(
                3,
                vec![cmd(&["PS"], &[10, 11]), cmd(&["PS"], &[]), cmd(&["PS"], &[1, 2, 3])],
            )],
        };
        let out = render(&config);
        assert!(out.contains("static uint8 s3_coeData[5] = {\n   10, 11,\n   1, 2, 3\n};\n"));
        assert!(out.contains(".DataSize = 2,\n      .Data = (s3_coeData + 0)\n"));
        assert!(out.contains(".DataSize = 0,\n      .Data = NULL\n"));
        assert!(out.contains(".DataSize = 3,\n      .Data = (s3_coeData + 2)\n"));
    }

    #[test]
    fn test_no_data_table_without_data() {
        let config = Configuration {
            slaves: vec![slave(1, vec![cmd(&["PS"], &[])])],
        };
        let out = render(&config);
        assert!(!out.contains("coeData"));
        assert!(out.contains("static ec_enicoecmdt s1_coeCmds[1] = {"));
    }

    #[test]
    fn test_sorted_by_slave_id() {
        let config = Configuration {
            slaves: vec![
                slave(5, vec![cmd(&["PS"], &[])]),
                slave(2, vec![]),
                slave(1, vec![cmd(&["SP"], &[])]),
            ],
        };
        let out = render(&config);
        let s1 = out.find("s1_coeCmds[1]").unwrap();
        let s5 = out.find("s5_coeCmds[1]").unwrap();
        assert!(s1 < s5);
        assert!(out.contains("static ec_enislavet eniSlave[2] = {"));
        let e1 = out.find(".Slave = 1,").unwrap();
        let e5 = out.find(".Slave = 5,").unwrap();
        assert!(e1 < e5);
        assert!(!out.contains(".Slave = 2,"));
        assert!(out.contains(".slave = eniSlave,\n   .slavecount = 2\n"));
    }

    #[test]
    fn test_custom_include() {
        let args = Args::new("ethercat.h");
        let mut out = Vec::new();
        generate(&args, &Configuration::default(), &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("#include \"ethercat.h\"\n\n"));
    }
}
