//! The normalized configuration model and its construction from an ENI
//! document.

use std::io;

use log::{debug, info};

use crate::element::Element;
use crate::error::EniError;

/// The bus configuration: every `Slave` of the ENI file in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    pub slaves: Vec<SlaveConfig>,
}

/// One bus device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlaveConfig {
    pub slave: u16,
    pub vendor_id: u32,
    pub product_code: u32,
    pub revision_no: u32,
    /// Enabled CoE init commands, in document order.
    pub coe_cmds: Vec<CoEInitCommand>,
}

/// One CoE mailbox init command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoEInitCommand {
    pub comment: String,
    /// Transition names without the `ECT_ESMTRANS_` prefix, e.g. `PS`.
    pub transitions: Vec<String>,
    pub complete_access: bool,
    pub ccs: u8,
    pub index: u16,
    pub sub_index: u8,
    /// Timeout in microseconds.
    pub timeout: i32,
    pub data: Vec<u8>,
}

const SLAVE_PATH: &str = "Slave";
const INIT_CMD_PATH: &str = "Mailbox/CoE/InitCmds/InitCmd";

/// Read an ENI document and build its configuration.
///
/// The document may be rooted at `EtherCATConfig` or wrap that element one
/// level deeper.
pub fn parse_eni<R: io::Read>(fin: R) -> Result<Configuration, EniError> {
    let root = Element::parse(fin)?;
    let path = if root.name == "EtherCATConfig" {
        "Config"
    } else {
        "EtherCATConfig/Config"
    };
    debug!("Document root is <{}>, reading {}", root.name, path);
    parse_config(root.find_one(path)?)
}

/// Build a configuration from a `Config` element.
pub fn parse_config(element: &Element) -> Result<Configuration, EniError> {
    let slaves = element
        .find(SLAVE_PATH, None, None)?
        .into_iter()
        .enumerate()
        .map(|(i, e)| parse_slave(e, i as i128 + 1))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Configuration { slaves })
}

/// Build one slave; `position` is its 1-based index in the document.
///
/// The slave address is `1 - AutoIncAddr`, taken modulo 2^16; without an
/// `AutoIncAddr` the position is used.
pub fn parse_slave(element: &Element, position: i128) -> Result<SlaveConfig, EniError> {
    let auto_inc = element.read_optional_int("Info/AutoIncAddr", 1 - position)?;
    let slave = SlaveConfig {
        slave: (1i128.wrapping_sub(auto_inc) & 0xffff) as u16,
        vendor_id: (element.read_int("Info/VendorId")? & 0xffff_ffff) as u32,
        product_code: (element.read_int("Info/ProductCode")? & 0xffff_ffff) as u32,
        revision_no: (element.read_int("Info/RevisionNo")? & 0xffff_ffff) as u32,
        coe_cmds: parse_coe_init_cmds(element.find(INIT_CMD_PATH, None, None)?)?,
    };
    debug!(
        "Slave {} (position {}): vendor 0x{:08X}, product 0x{:08X}, revision 0x{:08X}, \
         {} CoE command(s)",
        slave.slave,
        position,
        slave.vendor_id,
        slave.product_code,
        slave.revision_no,
        slave.coe_cmds.len()
    );
    Ok(slave)
}

fn parse_coe_init_cmds(elements: Vec<&Element>) -> Result<Vec<CoEInitCommand>, EniError> {
    let mut cmds = Vec::with_capacity(elements.len());
    for e in elements {
        if is_disabled(e)? {
            let comment = e.read_optional_text("Comment", "")?;
            info!("Skipping disabled CoE init command '{}'", comment.trim());
            continue;
        }
        cmds.push(parse_coe_init_cmd(e)?);
    }
    Ok(cmds)
}

/// Both the `Disabled` attribute and a `Disabled` child element are honoured.
fn is_disabled(element: &Element) -> Result<bool, EniError> {
    Ok(element.attribute("Disabled") == Some("1")
        || element.read_optional_text("Disabled", "")? == "1")
}

pub fn parse_coe_init_cmd(element: &Element) -> Result<CoEInitCommand, EniError> {
    let transitions = element
        .find("Transition", Some(1), None)?
        .into_iter()
        .map(|t| {
            let name = t.text().trim();
            if name.is_empty() {
                Err(EniError::value("Empty Transition element"))
            } else {
                Ok(name.to_string())
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Timeout is a C int in microseconds; like every other field it is
    // reduced to its width.
    let timeout = (element.read_int("Timeout")?.wrapping_mul(1000) & 0xffff_ffff) as u32 as i32;

    let data_text: String = element
        .read_optional_text("Data", "")?
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let cmd = CoEInitCommand {
        comment: element.read_optional_text("Comment", "")?.to_string(),
        transitions,
        complete_access: element.attribute("CompleteAccess") == Some("1"),
        ccs: (element.read_int("Ccs")? & 0xff) as u8,
        index: (element.read_int("Index")? & 0xffff) as u16,
        sub_index: (element.read_int("SubIndex")? & 0xff) as u8,
        timeout,
        data: hex::decode(&data_text)?,
    };
    debug!(
        "CoE command 0x{:04X}:{} ccs {} on {}, {} data byte(s)",
        cmd.index,
        cmd.sub_index,
        cmd.ccs,
        cmd.transitions.join("|"),
        cmd.data.len()
    );
    Ok(cmd)
}
