//! Line-oriented command parsing for the interactive prompt.

use num_bigint::BigUint;

pub const HELP: &str = "\
Commands:
  connect                      prompt the wallet for account access
  disconnect                   forget the session locally
  refresh [address]            fetch the balance (connected account by default)
  status                       print the current session
  help                         show this help
  quit                         unmount the session and exit

Simulator (WALLET_PROVIDER=memory):
  sim accounts <addr> [addr..] replace the wallet's accounts
  sim revoke                   withdraw this origin's authorization
  sim chain <chain-id>         switch networks
  sim balance <chain-id> <addr> <wei>
  sim install | sim uninstall  toggle provider presence";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect,
    Disconnect,
    Refresh(Option<String>),
    Status,
    Help,
    Quit,
    Sim(SimCommand),
}

/// Scripted provider changes, only valid with the in-memory provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCommand {
    Accounts(Vec<String>),
    Revoke,
    Chain(String),
    Balance {
        chain_id: String,
        address: String,
        wei: BigUint,
    },
    Install,
    Uninstall,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match (head.to_ascii_lowercase().as_str(), rest.as_slice()) {
        ("connect", []) => Command::Connect,
        ("disconnect", []) => Command::Disconnect,
        ("refresh", []) => Command::Refresh(None),
        ("refresh", [address]) => Command::Refresh(Some(address.to_string())),
        ("status", []) => Command::Status,
        ("help" | "?", []) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        ("sim", args) => Command::Sim(parse_sim(args)?),
        (other, _) => return Err(format!("Unknown command or arguments: '{}' (try 'help')", other)),
    };

    Ok(Some(command))
}

fn parse_sim(args: &[&str]) -> Result<SimCommand, String> {
    match args {
        ["accounts", accounts @ ..] => Ok(SimCommand::Accounts(
            accounts.iter().map(|a| a.to_string()).collect(),
        )),
        ["revoke"] => Ok(SimCommand::Revoke),
        ["chain", chain_id] => Ok(SimCommand::Chain(chain_id.to_string())),
        ["balance", chain_id, address, wei] => {
            let wei = BigUint::parse_bytes(wei.as_bytes(), 10)
                .ok_or_else(|| format!("Balance must be a decimal wei amount, got '{}'", wei))?;
            Ok(SimCommand::Balance {
                chain_id: chain_id.to_string(),
                address: address.to_string(),
                wei,
            })
        }
        ["install"] => Ok(SimCommand::Install),
        ["uninstall"] => Ok(SimCommand::Uninstall),
        _ => Err("Unknown sim command (try 'help')".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_commands() {
        assert_eq!(parse("connect"), Ok(Some(Command::Connect)));
        assert_eq!(parse("  DISCONNECT "), Ok(Some(Command::Disconnect)));
        assert_eq!(parse("refresh"), Ok(Some(Command::Refresh(None))));
        assert_eq!(
            parse("refresh 0xabc0000000000000000000000000000000000001"),
            Ok(Some(Command::Refresh(Some(
                "0xabc0000000000000000000000000000000000001".to_string()
            ))))
        );
        assert_eq!(parse(""), Ok(None));
        assert!(parse("connect now").is_err());
    }

    #[test]
    fn test_parse_sim_commands() {
        assert_eq!(
            parse("sim accounts"),
            Ok(Some(Command::Sim(SimCommand::Accounts(vec![]))))
        );
        assert_eq!(
            parse("sim chain 0x89"),
            Ok(Some(Command::Sim(SimCommand::Chain("0x89".to_string()))))
        );
        assert_eq!(
            parse("sim balance 0x1 0xabc 1500"),
            Ok(Some(Command::Sim(SimCommand::Balance {
                chain_id: "0x1".to_string(),
                address: "0xabc".to_string(),
                wei: BigUint::from(1500u32),
            })))
        );
        assert!(parse("sim balance 0x1 0xabc 1.5").is_err());
        assert!(parse("sim teleport").is_err());
    }
}
