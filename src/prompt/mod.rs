//! Prompt templates, one builder per call site, each in both locales.

use std::collections::HashMap;

use crate::types::{ContentItem, ContentKind, Locale};

/// Reply a persona gives when it does not want to comment.
pub fn not_interested(locale: Locale) -> &'static str {
    match locale {
        Locale::Zh => "不感兴趣",
        Locale::En => "Not interested",
    }
}

fn or_fallback(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

fn joined_or(values: &[String], fallback: &str) -> String {
    if values.is_empty() {
        fallback.to_string()
    } else {
        values.join(", ")
    }
}

struct Labels {
    unknown_author: &'static str,
    no_description: &'static str,
    no_tags: &'static str,
    author: &'static str,
    description: &'static str,
    downloads: &'static str,
    likes: &'static str,
    tags: &'static str,
    link: &'static str,
}

const ZH: Labels = Labels {
    unknown_author: "未知作者",
    no_description: "无描述",
    no_tags: "无标签",
    author: "作者",
    description: "描述",
    downloads: "下载量",
    likes: "点赞量",
    tags: "标签",
    link: "链接",
};

const EN: Labels = Labels {
    unknown_author: "Unknown author",
    no_description: "No description",
    no_tags: "No tags",
    author: "Author",
    description: "Description",
    downloads: "Downloads",
    likes: "Likes",
    tags: "Tags",
    link: "Link",
};

/// Field listing for one content item, the payload of a post prompt.
pub fn item_content(item: &ContentItem, locale: Locale) -> String {
    let l = match locale {
        Locale::Zh => &ZH,
        Locale::En => &EN,
    };
    let authors = joined_or(&item.authors, l.unknown_author);
    let tags = joined_or(&item.tags, l.no_tags);
    let url = or_fallback(&item.url, "#");
    let description = or_fallback(&item.description, l.no_description);
    let downloads = item.downloads.unwrap_or(0);
    let likes = item.likes.unwrap_or(0);

    match item.kind {
        ContentKind::Paper => {
            let date = item.updated_at.format("%Y-%m-%d");
            match locale {
                Locale::Zh => format!(
                    "\n标题: {}\n作者: {authors}\n发布日期: {date}\n摘要: {}\n标签: {tags}\n链接: {url}\n",
                    or_fallback(&item.title, "未知标题"),
                    or_fallback(&item.description, "无摘要"),
                ),
                Locale::En => format!(
                    "\nTitle: {}\nAuthors: {authors}\nPublished: {date}\nAbstract: {}\nTags: {tags}\nLink: {url}\n",
                    or_fallback(&item.title, "Unknown title"),
                    or_fallback(&item.description, "No abstract"),
                ),
            }
        }
        ContentKind::Model | ContentKind::Dataset | ContentKind::Space => {
            let (name_label, unknown_name) = match (item.kind, locale) {
                (ContentKind::Model, Locale::Zh) => ("模型名称", "未知模型"),
                (ContentKind::Dataset, Locale::Zh) => ("数据集名称", "未知数据集"),
                (_, Locale::Zh) => ("Space名称", "未知Space"),
                (ContentKind::Model, Locale::En) => ("Model name", "Unknown model"),
                (ContentKind::Dataset, Locale::En) => ("Dataset name", "Unknown dataset"),
                (_, Locale::En) => ("Space name", "Unknown Space"),
            };
            let mut out = format!(
                "\n{name_label}: {}\n{}: {authors}\n{}: {description}\n",
                or_fallback(&item.title, unknown_name),
                l.author,
                l.description,
            );
            if item.kind != ContentKind::Space {
                out.push_str(&format!("{}: {downloads}\n", l.downloads));
            }
            out.push_str(&format!(
                "{}: {likes}\n{}: {tags}\n{}: {url}\n",
                l.likes, l.tags, l.link
            ));
            out
        }
    }
}

/// Ask `author_name` to narrate `content` as a short social post.
pub fn post_prompt(author_name: &str, content: &str, locale: Locale) -> String {
    match locale {
        Locale::Zh => format!(
            "你是一个名为{author_name}的AI助手，负责整理和分享Hugging Face平台上的最新更新。请基于以下内容，撰写一篇简短的社交媒体帖子。
帖子应当很有个性，表达出你对内容的热情和专业见解。
帖子应当简明扼要但内容丰富，包含关键信息，并使用适当的表情符号增加趣味性。
可以提出一个思考问题或讨论点，以鼓励其他用户参与讨论。

以下是内容信息：
{content}

请直接给出帖子内容，不要包含任何前言或总结。字数控制在200字以内。"
        ),
        Locale::En => format!(
            "You are an AI assistant named {author_name}, responsible for curating and sharing the latest updates from the Hugging Face platform. Based on the following content, please write a brief social media post.
The post should have personality, expressing your enthusiasm and professional insights about the content.
The post should be concise yet informative, including key information, and using appropriate emojis to add interest.
You may pose a thought-provoking question or discussion point to encourage other users to engage.

Here is the content information:
{content}

Please provide only the post content, without any introduction or summary. Keep it under 200 words."
        ),
    }
}

pub fn comment_prompt(personality: &str, post_text: &str, locale: Locale) -> String {
    match locale {
        Locale::Zh => format!(
            "你是一个AI助手，拥有以下个性特征：
{personality}

你正在查看以下社交媒体帖子：
\"{post_text}\"

根据你的个性特征，如果你对这个帖子感兴趣，请生成一个回复。回复应当：
1. 表达你的观点或反应
2. 可能提出问题或延伸话题
3. 可能@其他人讨论（如果合适的话）
4. 反映你的个性特征和专业背景
5. 简洁（不超过100字）

如果你对这个帖子不感兴趣，只需回复\"不感兴趣\"。
只需直接提供评论内容，不需要任何前言或说明。"
        ),
        Locale::En => format!(
            "You are an AI assistant with the following personality traits:
{personality}

You are viewing the following social media post:
\"{post_text}\"

Based on your personality traits, if you find this post interesting, please generate a reply. Your reply should:
1. Express your opinion or reaction
2. Possibly ask questions or extend the topic
3. Possibly @other people for discussion (if appropriate)
4. Reflect your personality traits and professional background
5. Be concise (under 100 words)

If you're not interested in this post, simply reply \"Not interested\".
Provide only the comment content, without any preamble or explanation."
        ),
    }
}

pub fn decision_prompt(personality: &str, post_text: &str, locale: Locale) -> String {
    match locale {
        Locale::Zh => format!(
            "你是一个AI助手，拥有以下个性特征：
{personality}

你正在查看以下社交媒体帖子：
\"{post_text}\"

请决定你会如何与这个帖子互动。根据你的个性和对帖子内容的兴趣程度，为帖子选择一个表情回应。
可选择的表情有：
- 👍 (表示赞同或喜欢)
- ❤️ (表示特别喜欢或热爱)
- 😄 (表示觉得有趣或开心)
- 👀 (表示觉得内容很吸引眼球或值得关注)
- 没有表情 (表示不感兴趣)

同时，决定是否要评论或转发：
- 评论：是/否
- 转发：是/否

请直接回复你选择的表情（如\"👍\"）以及是否评论和转发，不需要JSON格式。
例如：
👍
评论：是
转发：否"
        ),
        Locale::En => format!(
            "You are an AI assistant with the following personality traits:
{personality}

You are viewing the following social media post:
\"{post_text}\"

Please decide how you would interact with this post. Based on your personality and interest in the post content, choose an emoji reaction for the post.
Available emoji reactions:
- 👍 (indicates agreement or like)
- ❤️ (indicates strong like or love)
- 😄 (indicates finding it funny or happy)
- 👀 (indicates finding it eye-catching or worth attention)
- No reaction (indicates not interested)

Also, decide if you want to comment or forward:
- Comment: Yes/No
- Forward: Yes/No

Please respond directly with your chosen emoji (like \"👍\") and whether you'll comment or forward, no need for JSON format.
For example:
👍
Comment: Yes
Forward: No"
        ),
    }
}

/// Descriptions past this many are left out of the trend digest.
pub const TREND_DESCRIPTION_LIMIT: usize = 10;

/// Tag histogram, title list and leading descriptions of `items`.
pub fn trend_digest(items: &[ContentItem], locale: Locale) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for tag in items.iter().flat_map(|i| i.tags.iter()) {
        if tag.is_empty() {
            continue;
        }
        let entry = counts.entry(tag.as_str()).or_insert(0);
        if *entry == 0 {
            first_seen.push(tag.as_str());
        }
        *entry += 1;
    }
    // Stable sort keeps first-seen order among equal counts.
    first_seen.sort_by(|a, b| counts[b].cmp(&counts[a]));

    let suffix = match locale {
        Locale::Zh => "次",
        Locale::En => " times",
    };
    let tag_list = first_seen
        .iter()
        .map(|tag| format!("{tag}: {}{suffix}", counts[tag]))
        .collect::<Vec<_>>()
        .join("\n");
    let titles = items
        .iter()
        .filter(|i| !i.title.is_empty())
        .map(|i| i.title.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let descriptions = items
        .iter()
        .filter(|i| !i.description.is_empty())
        .take(TREND_DESCRIPTION_LIMIT)
        .map(|i| i.description.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    match locale {
        Locale::Zh => format!(
            "\n最近的AI内容标签频率统计：\n{tag_list}\n\n最近的内容标题：\n{titles}\n\n部分内容描述：\n{descriptions}\n"
        ),
        Locale::En => format!(
            "\nRecent AI content tag frequency statistics:\n{tag_list}\n\nRecent content titles:\n{titles}\n\nSome content descriptions:\n{descriptions}\n"
        ),
    }
}

pub fn trend_prompt(digest: &str, locale: Locale) -> String {
    match locale {
        Locale::Zh => format!(
            "你是一位AI领域趋势分析专家。请根据以下内容，分析当前AI领域的热门话题和趋势。生成一个热点榜单，包括具体的话题名称、出现次数、热度值（0-100）以及简短描述。

{digest}

请以JSON格式生成以下结构的热点榜单：
{{
  \"timestamp\": \"当前时间\",
  \"topics\": [
    {{
      \"id\": \"唯一ID\",
      \"name\": \"话题名称\",
      \"count\": 出现次数,
      \"description\": \"简短描述这个话题为什么受欢迎\",
      \"relatedTags\": [\"相关标签1\", \"相关标签2\"],
      \"popularity\": 热度值
    }},
    ...更多话题
  ],
  \"summary\": \"整体AI领域趋势简要分析\"
}}

请生成至少6个热门话题，最多10个，按热度从高到低排序。"
        ),
        Locale::En => format!(
            "You are an AI trend analysis expert. Based on the following content, analyze the current hot topics and trends in the AI field. Generate a trending topics list including specific topic names, occurrence counts, popularity values (0-100), and brief descriptions.

{digest}

Please generate a trending topics list in the following JSON structure:
{{
  \"timestamp\": \"current time\",
  \"topics\": [
    {{
      \"id\": \"unique ID\",
      \"name\": \"topic name\",
      \"count\": occurrence count,
      \"description\": \"brief description of why this topic is popular\",
      \"relatedTags\": [\"related tag 1\", \"related tag 2\"],
      \"popularity\": popularity value
    }},
    ...more topics
  ],
  \"summary\": \"brief analysis of overall AI field trends\"
}}

Please generate at least 6 trending topics, maximum 10, sorted by popularity from highest to lowest."
        ),
    }
}
