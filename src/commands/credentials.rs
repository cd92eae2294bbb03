/// Two-step credential conversation: ask for the account, then for the
/// password. The dispatcher keeps one flow per sender and feeds it every
/// follow-up message until it completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialFlow {
    AwaitingAccount,
    AwaitingPassword { account: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowStep {
    /// Next prompt to show; the flow continues.
    Prompt(&'static str),
    /// Both pieces collected; the flow is finished.
    Complete { account: String, password: String },
}

impl CredentialFlow {
    pub fn start() -> (Self, &'static str) {
        (Self::AwaitingAccount, "请输入账号")
    }

    pub fn advance(self, input: &str) -> (Option<Self>, FlowStep) {
        match self {
            Self::AwaitingAccount => {
                let account = input.trim().to_string();
                (
                    Some(Self::AwaitingPassword { account }),
                    FlowStep::Prompt("请输入密码"),
                )
            }
            Self::AwaitingPassword { account } => (
                None,
                FlowStep::Complete {
                    account,
                    password: input.trim().to_string(),
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_both_steps() {
        let (flow, prompt) = CredentialFlow::start();
        assert_eq!(prompt, "请输入账号");

        let (flow, step) = flow.advance("  user@example.com ");
        assert_eq!(step, FlowStep::Prompt("请输入密码"));

        let (flow, step) = flow.unwrap().advance("hunter2");
        assert!(flow.is_none());
        assert_eq!(
            step,
            FlowStep::Complete {
                account: "user@example.com".to_string(),
                password: "hunter2".to_string(),
            }
        );
    }
}
