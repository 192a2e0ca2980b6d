//! Response template rendering for embeds and buttons.
//!
//! A template is operator-written text containing `{placeholder}` tokens, which
//! are replaced with values about the invoking user and the guild, and
//! `{directive}` / `{directive:args}` tokens that control the output:
//!
//! - `{embed}` turns the rendered text into an embed description and suppresses
//!   the plain text.
//! - `{addrole:<ids>}` / `{removerole:<ids>}` collect roles to grant or revoke;
//!   ids are raw numbers or `<@&id>` mentions separated by spaces.
//!
//! The text is tokenized once. Only the first directive of each kind is honored;
//! repeats are kept as literal text. Unknown `{...}` runs are left untouched.

use crate::core::embed::EmbedSpec;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

/// Every placeholder the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Placeholder {
    User,
    UserTag,
    UserName,
    UserAvatar,
    UserDiscrim,
    UserId,
    UserNick,
    UserJoinDate,
    UserCreateDate,
    UserDisplayColor,
    UserBoostSince,
    ServerName,
    ServerId,
    ServerMemberCount,
    ServerMemberCountOrdinal,
    ServerMemberCountNoBots,
    ServerMemberCountNoBotsOrdinal,
    ServerBotCount,
    ServerBotCountOrdinal,
    ServerIcon,
    ServerRoleCount,
    ServerChannelCount,
    ServerRandomMember,
    ServerRandomMemberTag,
    ServerRandomMemberNoBots,
    ServerOwner,
    ServerOwnerId,
    ServerCreateDate,
    Newline,
}

impl Placeholder {
    /// All placeholders, in the order they are documented to users.
    pub const ALL: [Self; 29] = [
        Self::User,
        Self::UserTag,
        Self::UserName,
        Self::UserAvatar,
        Self::UserDiscrim,
        Self::UserId,
        Self::UserNick,
        Self::UserJoinDate,
        Self::UserCreateDate,
        Self::UserDisplayColor,
        Self::UserBoostSince,
        Self::ServerName,
        Self::ServerId,
        Self::ServerMemberCount,
        Self::ServerMemberCountOrdinal,
        Self::ServerMemberCountNoBots,
        Self::ServerMemberCountNoBotsOrdinal,
        Self::ServerBotCount,
        Self::ServerBotCountOrdinal,
        Self::ServerIcon,
        Self::ServerRoleCount,
        Self::ServerChannelCount,
        Self::ServerRandomMember,
        Self::ServerRandomMemberTag,
        Self::ServerRandomMemberNoBots,
        Self::ServerOwner,
        Self::ServerOwnerId,
        Self::ServerCreateDate,
        Self::Newline,
    ];

    /// The name written between braces.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::UserTag => "user_tag",
            Self::UserName => "user_name",
            Self::UserAvatar => "user_avatar",
            Self::UserDiscrim => "user_discrim",
            Self::UserId => "user_id",
            Self::UserNick => "user_nick",
            Self::UserJoinDate => "user_joindate",
            Self::UserCreateDate => "user_createdate",
            Self::UserDisplayColor => "user_displaycolor",
            Self::UserBoostSince => "user_boostsince",
            Self::ServerName => "server_name",
            Self::ServerId => "server_id",
            Self::ServerMemberCount => "server_membercount",
            Self::ServerMemberCountOrdinal => "server_membercount_ordinal",
            Self::ServerMemberCountNoBots => "server_membercount_nobots",
            Self::ServerMemberCountNoBotsOrdinal => "server_membercount_nobots_ordinal",
            Self::ServerBotCount => "server_botcount",
            Self::ServerBotCountOrdinal => "server_botcount_ordinal",
            Self::ServerIcon => "server_icon",
            Self::ServerRoleCount => "server_rolecount",
            Self::ServerChannelCount => "server_channelcount",
            Self::ServerRandomMember => "server_randommember",
            Self::ServerRandomMemberTag => "server_randommember_tag",
            Self::ServerRandomMemberNoBots => "server_randommember_nobots",
            Self::ServerOwner => "server_owner",
            Self::ServerOwnerId => "server_owner_id",
            Self::ServerCreateDate => "server_createdate",
            Self::Newline => "newline",
        }
    }

    /// Looks a placeholder up by its (case-sensitive) name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// A control token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `{embed}`
    Embed,
    /// `{addrole:<args>}`
    AddRole(&'a str),
    /// `{removerole:<args>}`
    RemoveRole(&'a str),
}

/// One piece of a tokenized template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Text copied through as-is (including unknown `{...}` runs)
    Literal(&'a str),
    /// A known `{placeholder}`
    Placeholder(Placeholder),
    /// A directive, with the raw text it was parsed from
    Directive {
        /// Parsed directive
        directive: Directive<'a>,
        /// Original `{...}` text
        raw: &'a str,
    },
}

fn classify(inner: &str) -> Option<TokenKind<'_>> {
    if inner == "embed" {
        return Some(TokenKind::Directive(Directive::Embed));
    }
    if let Some(args) = inner.strip_prefix("addrole:") {
        return (!args.is_empty()).then_some(TokenKind::Directive(Directive::AddRole(args)));
    }
    if let Some(args) = inner.strip_prefix("removerole:") {
        return (!args.is_empty()).then_some(TokenKind::Directive(Directive::RemoveRole(args)));
    }
    Placeholder::from_name(inner).map(TokenKind::Placeholder)
}

enum TokenKind<'a> {
    Placeholder(Placeholder),
    Directive(Directive<'a>),
}

/// Splits a template into literal text, placeholders and directives in one pass.
///
/// Adjacent literal text is merged into a single token, so an unknown `{foo}` stays
/// inside the surrounding literal.
#[must_use]
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(open_offset) = text[cursor..].find('{') {
        let open = cursor + open_offset;
        let body_start = open + 1;
        let Some(close_offset) = text[body_start..].find(['{', '}']) else {
            break;
        };
        let close = body_start + close_offset;

        // `{{user}`: restart at the inner brace.
        if text.as_bytes()[close] == b'{' {
            cursor = close;
            continue;
        }

        if let Some(kind) = classify(&text[body_start..close]) {
            if literal_start < open {
                tokens.push(Token::Literal(&text[literal_start..open]));
            }
            tokens.push(match kind {
                TokenKind::Placeholder(placeholder) => Token::Placeholder(placeholder),
                TokenKind::Directive(directive) => Token::Directive {
                    directive,
                    raw: &text[open..=close],
                },
            });
            literal_start = close + 1;
        }
        cursor = close + 1;
    }

    if literal_start < text.len() {
        tokens.push(Token::Literal(&text[literal_start..]));
    }
    tokens
}

/// Snapshot of a guild member used for statistics and random picks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSummary {
    /// User id
    pub id: u64,
    /// `name` or `name#1234`
    pub tag: String,
    /// Whether the account is a bot
    pub bot: bool,
}

impl MemberSummary {
    /// `<@id>`
    #[must_use]
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// The invoking user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFacet {
    /// User id
    pub id: u64,
    /// Account name
    pub name: String,
    /// `name` or `name#1234`
    pub tag: String,
    /// Avatar URL, if the user has one
    pub avatar_url: Option<String>,
    /// Legacy discriminator, if any
    pub discriminator: Option<String>,
    /// Account creation time
    pub created_at: Option<DateTime<Utc>>,
}

/// The invoking user as a member of the guild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFacet {
    /// Guild nickname
    pub nick: Option<String>,
    /// When the member joined
    pub joined_at: Option<DateTime<Utc>>,
    /// When the member started boosting
    pub boost_since: Option<DateTime<Utc>>,
    /// Display colour as `#rrggbb`
    pub display_color: String,
}

/// The guild the template is rendered in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuildFacet {
    /// Guild id
    pub id: u64,
    /// Guild name
    pub name: String,
    /// Member count reported by Discord
    pub member_count: u64,
    /// Cached members
    pub members: Vec<MemberSummary>,
    /// Owner's user id
    pub owner_id: u64,
    /// Icon URL, if any
    pub icon_url: Option<String>,
    /// Number of channels
    pub channel_count: usize,
    /// Ids of every role in the guild
    pub role_ids: Vec<u64>,
    /// Guild creation time
    pub created_at: Option<DateTime<Utc>>,
}

/// Everything a render call may read. Assembled fresh per call, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    /// The invoking user
    pub user: UserFacet,
    /// The invoking user's guild membership
    pub member: MemberFacet,
    /// The guild
    pub guild: GuildFacet,
}

impl TemplateContext {
    /// Resolves a role token (`123` or `<@&123>`) to a role of this guild.
    #[must_use]
    pub fn resolve_role(&self, token: &str) -> Option<u64> {
        let digits = token
            .strip_prefix("<@&")
            .and_then(|rest| rest.strip_suffix('>'))
            .unwrap_or(token);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let id = digits.parse::<u64>().ok()?;
        self.guild.role_ids.contains(&id).then_some(id)
    }
}

/// The result of rendering a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    /// Text to send; empty whenever `embed` is set
    pub plain_text: String,
    /// Embed to send instead of plain text
    pub embed: Option<EmbedSpec>,
    /// Roles to grant, in template order
    pub roles_to_add: Vec<u64>,
    /// Roles to revoke, in template order
    pub roles_to_remove: Vec<u64>,
}

/// English ordinal suffix: 1st, 2nd, 3rd, 4th, 11th, 12th, 13th, 21st...
#[must_use]
pub const fn ordinal_suffix(n: u64) -> &'static str {
    if matches!(n % 100, 11..=13) {
        return "th";
    }
    match n % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

fn with_ordinal(n: u64) -> String {
    format!("{n}{}", ordinal_suffix(n))
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Values computed once per render: counts and random member picks.
struct RenderValues<'a> {
    ctx: &'a TemplateContext,
    humans: u64,
    bots: u64,
    random_member: (String, String),
    random_human: String,
}

impl<'a> RenderValues<'a> {
    fn compute<R: Rng + ?Sized>(ctx: &'a TemplateContext, rng: &mut R) -> Self {
        let members = &ctx.guild.members;
        let humans: Vec<&MemberSummary> = members.iter().filter(|m| !m.bot).collect();
        let bots = members.len() - humans.len();

        let user_mention = format!("<@{}>", ctx.user.id);
        let random_member = members.choose(rng).map_or_else(
            || (user_mention.clone(), ctx.user.tag.clone()),
            |m| (m.mention(), m.tag.clone()),
        );
        let random_human = humans
            .choose(rng)
            .map_or(user_mention, |m| m.mention());

        Self {
            ctx,
            humans: humans.len() as u64,
            bots: bots as u64,
            random_member,
            random_human,
        }
    }

    fn value(&self, placeholder: Placeholder) -> String {
        let user = &self.ctx.user;
        let member = &self.ctx.member;
        let guild = &self.ctx.guild;
        match placeholder {
            Placeholder::User => format!("<@{}>", user.id),
            Placeholder::UserTag => user.tag.clone(),
            Placeholder::UserName => user.name.clone(),
            Placeholder::UserAvatar => user.avatar_url.clone().unwrap_or_default(),
            Placeholder::UserDiscrim => user.discriminator.clone().unwrap_or_default(),
            Placeholder::UserId => user.id.to_string(),
            Placeholder::UserNick => member.nick.clone().unwrap_or_else(|| user.name.clone()),
            Placeholder::UserJoinDate => format_date(member.joined_at),
            Placeholder::UserCreateDate => format_date(user.created_at),
            Placeholder::UserDisplayColor => member.display_color.clone(),
            Placeholder::UserBoostSince => format_date(member.boost_since),
            Placeholder::ServerName => guild.name.clone(),
            Placeholder::ServerId => guild.id.to_string(),
            Placeholder::ServerMemberCount => guild.member_count.to_string(),
            Placeholder::ServerMemberCountOrdinal => with_ordinal(guild.member_count),
            Placeholder::ServerMemberCountNoBots => self.humans.to_string(),
            Placeholder::ServerMemberCountNoBotsOrdinal => with_ordinal(self.humans),
            Placeholder::ServerBotCount => self.bots.to_string(),
            Placeholder::ServerBotCountOrdinal => with_ordinal(self.bots),
            Placeholder::ServerIcon => guild.icon_url.clone().unwrap_or_default(),
            Placeholder::ServerRoleCount => guild.role_ids.len().to_string(),
            Placeholder::ServerChannelCount => guild.channel_count.to_string(),
            Placeholder::ServerRandomMember => self.random_member.0.clone(),
            Placeholder::ServerRandomMemberTag => self.random_member.1.clone(),
            Placeholder::ServerRandomMemberNoBots => self.random_human.clone(),
            Placeholder::ServerOwner => format!("<@{}>", guild.owner_id),
            Placeholder::ServerOwnerId => guild.owner_id.to_string(),
            Placeholder::ServerCreateDate => format_date(guild.created_at),
            Placeholder::Newline => "\n".to_string(),
        }
    }
}

fn resolve_roles(args: &str, ctx: &TemplateContext) -> Vec<u64> {
    args.split_whitespace()
        .filter_map(|token| ctx.resolve_role(token))
        .collect()
}

/// Renders a template with the thread-local RNG.
#[must_use]
pub fn render(template: &str, ctx: &TemplateContext) -> Rendered {
    render_with_rng(template, ctx, &mut rand::thread_rng())
}

/// Renders a template, drawing random member picks from `rng`.
#[must_use]
pub fn render_with_rng<R: Rng + ?Sized>(
    template: &str,
    ctx: &TemplateContext,
    rng: &mut R,
) -> Rendered {
    let values = RenderValues::compute(ctx, rng);
    let mut text = String::with_capacity(template.len());
    let mut embed = false;
    let mut roles_to_add = None;
    let mut roles_to_remove = None;

    for token in tokenize(template) {
        match token {
            Token::Literal(literal) => text.push_str(literal),
            Token::Placeholder(placeholder) => text.push_str(&values.value(placeholder)),
            Token::Directive { directive, raw } => match directive {
                Directive::Embed if !embed => embed = true,
                Directive::AddRole(args) if roles_to_add.is_none() => {
                    roles_to_add = Some(resolve_roles(args, ctx));
                }
                Directive::RemoveRole(args) if roles_to_remove.is_none() => {
                    roles_to_remove = Some(resolve_roles(args, ctx));
                }
                _ => text.push_str(raw),
            },
        }
    }

    let text = text.trim().to_string();
    let (plain_text, embed) = if embed {
        (String::new(), Some(EmbedSpec::with_description(text)))
    } else {
        (text, None)
    };

    Rendered {
        plain_text,
        embed,
        roles_to_add: roles_to_add.unwrap_or_default(),
        roles_to_remove: roles_to_remove.unwrap_or_default(),
    }
}

/// Replaces placeholders only; directives and unknown tokens stay verbatim and
/// whitespace is preserved.
#[must_use]
pub fn substitute(text: &str, ctx: &TemplateContext) -> String {
    let values = RenderValues::compute(ctx, &mut rand::thread_rng());
    tokenize(text)
        .into_iter()
        .map(|token| match token {
            Token::Literal(literal) => literal.to_string(),
            Token::Placeholder(placeholder) => values.value(placeholder),
            Token::Directive { raw, .. } => raw.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]
    use super::*;
    use crate::test_utils::sample_template_context;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_tokenize_mixed() {
        let tokens = tokenize("Hi {user}, {unknown} {addrole:1 2}!");
        assert_eq!(
            tokens,
            vec![
                Token::Literal("Hi "),
                Token::Placeholder(Placeholder::User),
                Token::Literal(", {unknown} "),
                Token::Directive {
                    directive: Directive::AddRole("1 2"),
                    raw: "{addrole:1 2}",
                },
                Token::Literal("!"),
            ]
        );
    }

    #[test]
    fn test_tokenize_unbalanced_braces() {
        assert_eq!(tokenize("{{user}"), vec![
            Token::Literal("{"),
            Token::Placeholder(Placeholder::User),
        ]);
        assert_eq!(tokenize("open {user"), vec![Token::Literal("open {user")]);
        assert_eq!(tokenize("{addrole:}"), vec![Token::Literal("{addrole:}")]);
    }

    #[test]
    fn test_placeholders_are_case_sensitive() {
        assert_eq!(tokenize("{USER}"), vec![Token::Literal("{USER}")]);
        assert_eq!(tokenize("{Embed}"), vec![Token::Literal("{Embed}")]);
    }

    #[test]
    fn test_placeholder_names_round_trip() {
        for placeholder in Placeholder::ALL {
            assert_eq!(Placeholder::from_name(placeholder.name()), Some(placeholder));
        }
    }

    #[test]
    fn test_embed_directive_suppresses_plain_text() {
        let ctx = sample_template_context();
        let rendered = render_with_rng("Hello {user}! {embed} welcome", &ctx, &mut rng());

        assert_eq!(rendered.plain_text, "");
        let embed = rendered.embed.expect("embed directive should produce an embed");
        assert_eq!(embed.description, "Hello <@42>!  welcome");
    }

    #[test]
    fn test_addrole_directive_strips_surrounding_whitespace() {
        let ctx = sample_template_context();
        let rendered = render_with_rng("{addrole:111 222} done", &ctx, &mut rng());

        assert_eq!(rendered.roles_to_add, vec![111, 222]);
        assert_eq!(rendered.plain_text, "done");
        assert!(rendered.embed.is_none());
    }

    #[test]
    fn test_role_mentions_and_unknown_roles() {
        let ctx = sample_template_context();
        let rendered = render_with_rng(
            "{removerole:<@&222> 999 abc <@&> <@&111} bye",
            &ctx,
            &mut rng(),
        );

        assert_eq!(rendered.roles_to_remove, vec![222]);
        assert!(rendered.roles_to_add.is_empty());
        assert_eq!(rendered.plain_text, "bye");
    }

    #[test]
    fn test_only_first_directive_of_each_kind_is_honored() {
        let ctx = sample_template_context();
        let rendered = render_with_rng("{addrole:111} {addrole:222} ok", &ctx, &mut rng());

        assert_eq!(rendered.roles_to_add, vec![111]);
        assert_eq!(rendered.plain_text, "{addrole:222} ok");
    }

    #[test]
    fn test_unknown_tokens_are_left_verbatim() {
        let ctx = sample_template_context();
        let rendered = render_with_rng("{nope} {user_name}", &ctx, &mut rng());
        assert_eq!(rendered.plain_text, "{nope} tester");
    }

    #[test]
    fn test_guild_statistics() {
        let ctx = sample_template_context();
        let text = substitute(
            "{server_membercount_ordinal}|{server_membercount_nobots}|{server_botcount_ordinal}|{server_rolecount}|{server_owner}",
            &ctx,
        );
        assert_eq!(text, "3rd|2|1st|2|<@1>");
    }

    #[test]
    fn test_user_placeholders() {
        let ctx = sample_template_context();
        let text = substitute(
            "{user_nick}/{user_tag}/{user_joindate}/{user_boostsince}/{user_displaycolor}{newline}end",
            &ctx,
        );
        assert_eq!(text, "Nick/tester/2024-01-02//#ff0000\nend");
    }

    #[test]
    fn test_random_non_bot_member_is_never_a_bot() {
        let ctx = sample_template_context();
        let mut rng = rng();
        for _ in 0..50 {
            let rendered = render_with_rng("{server_randommember_nobots}", &ctx, &mut rng);
            assert_ne!(rendered.plain_text, "<@99>");
        }
    }

    #[test]
    fn test_random_member_falls_back_to_user() {
        let mut ctx = sample_template_context();
        ctx.guild.members.clear();
        let rendered = render_with_rng(
            "{server_randommember} {server_randommember_nobots} {server_randommember_tag}",
            &ctx,
            &mut rng(),
        );
        assert_eq!(rendered.plain_text, "<@42> <@42> tester");
    }

    #[test]
    fn test_substitute_keeps_directives_and_whitespace() {
        let ctx = sample_template_context();
        assert_eq!(substitute("  {embed} {user} ", &ctx), "  {embed} <@42> ");
    }

    #[test]
    fn test_ordinal_suffix() {
        let cases = [
            (1, "st"),
            (2, "nd"),
            (3, "rd"),
            (4, "th"),
            (11, "th"),
            (12, "th"),
            (13, "th"),
            (21, "st"),
            (101, "st"),
            (111, "th"),
            (0, "th"),
        ];
        for (n, suffix) in cases {
            assert_eq!(ordinal_suffix(n), suffix, "n = {n}");
        }
    }
}
