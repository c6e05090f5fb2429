/*
 * src/questions.rs
 * 漢字データ (3年生・4年生) を管理するモジュール
 */

use std::fmt;

use clap::ValueEnum;

/// 学年
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grade {
    Third,
    Fourth,
}

/// 出題範囲 (学年 or 両方)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum GradeScope {
    #[value(name = "3")]
    Third,
    #[value(name = "4")]
    Fourth,
    #[value(name = "both")]
    Both,
}

impl GradeScope {
    /// 選択画面に並べる順番
    pub const ALL: [GradeScope; 3] = [GradeScope::Third, GradeScope::Fourth, GradeScope::Both];

    pub fn label(self) -> &'static str {
        match self {
            GradeScope::Third => "3年生",
            GradeScope::Fourth => "4年生",
            GradeScope::Both => "3年生＋4年生",
        }
    }
}

impl fmt::Display for GradeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 漢字1文字分のデータ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KanjiEntry {
    pub id: &'static str,
    pub kanji: &'static str,
    /// 正解として受け付ける読み (先頭がフィードバックで表示する答え)
    pub readings: &'static [&'static str],
    pub meaning: &'static str,
    pub example: &'static str,
    pub grade: Grade,
}

impl KanjiEntry {
    /// フィードバックで表示する代表の読み
    pub fn canonical_reading(&self) -> &'static str {
        self.readings.first().copied().unwrap_or_default()
    }
}

/// 出題範囲ごとに漢字を取り出すデータ提供元
pub trait KanjiSource {
    fn entries_by_grade(&self, scope: GradeScope) -> Vec<&KanjiEntry>;
}

/// 組み込みの漢字データ
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinKanji;

impl KanjiSource for BuiltinKanji {
    fn entries_by_grade(&self, scope: GradeScope) -> Vec<&KanjiEntry> {
        match scope {
            GradeScope::Third => GRADE3_LIST.iter().collect(),
            GradeScope::Fourth => GRADE4_LIST.iter().collect(),
            GradeScope::Both => GRADE3_LIST.iter().chain(GRADE4_LIST).collect(),
        }
    }
}

/// 全学年の漢字
#[cfg(test)]
pub fn all_entries() -> impl Iterator<Item = &'static KanjiEntry> {
    GRADE3_LIST.iter().chain(GRADE4_LIST)
}

/// 3年生の漢字
pub const GRADE3_LIST: &[KanjiEntry] = &[
    KanjiEntry { id: "g3-01", kanji: "悪", readings: &["わるい", "あく", "お"], meaning: "よくないこと", example: "悪い天気", grade: Grade::Third },
    KanjiEntry { id: "g3-02", kanji: "安", readings: &["やすい", "あん"], meaning: "ねだんがひくい・おちつく", example: "安心する", grade: Grade::Third },
    KanjiEntry { id: "g3-03", kanji: "暗", readings: &["くらい", "あん"], meaning: "あかるくない", example: "暗い夜道", grade: Grade::Third },
    KanjiEntry { id: "g3-04", kanji: "医", readings: &["い"], meaning: "病気をなおすこと", example: "医者になる", grade: Grade::Third },
    KanjiEntry { id: "g3-05", kanji: "泳", readings: &["およぐ", "えい"], meaning: "水の中をすすむ", example: "海で泳ぐ", grade: Grade::Third },
    KanjiEntry { id: "g3-06", kanji: "駅", readings: &["えき"], meaning: "電車がとまるところ", example: "駅で待ち合わせる", grade: Grade::Third },
    KanjiEntry { id: "g3-07", kanji: "横", readings: &["よこ", "おう"], meaning: "左右のほうこう", example: "横にならぶ", grade: Grade::Third },
    KanjiEntry { id: "g3-08", kanji: "屋", readings: &["や", "おく"], meaning: "いえ・みせ", example: "本屋さん", grade: Grade::Third },
    KanjiEntry { id: "g3-09", kanji: "温", readings: &["あたたかい", "おん"], meaning: "ほどよくあつい", example: "温かいスープ", grade: Grade::Third },
    KanjiEntry { id: "g3-10", kanji: "開", readings: &["ひらく", "あける", "かい"], meaning: "しまっているものをあける", example: "まどを開ける", grade: Grade::Third },
    KanjiEntry { id: "g3-11", kanji: "寒", readings: &["さむい", "かん"], meaning: "気温がひくい", example: "寒い冬", grade: Grade::Third },
    KanjiEntry { id: "g3-12", kanji: "館", readings: &["かん", "やかた"], meaning: "大きなたてもの", example: "図書館", grade: Grade::Third },
    KanjiEntry { id: "g3-13", kanji: "起", readings: &["おきる", "おこす", "き"], meaning: "目をさます・たちあがる", example: "朝早く起きる", grade: Grade::Third },
    KanjiEntry { id: "g3-14", kanji: "急", readings: &["いそぐ", "きゅう"], meaning: "はやくする", example: "駅まで急ぐ", grade: Grade::Third },
    KanjiEntry { id: "g3-15", kanji: "球", readings: &["たま", "きゅう"], meaning: "まるいもの・ボール", example: "野球をする", grade: Grade::Third },
    KanjiEntry { id: "g3-16", kanji: "橋", readings: &["はし", "きょう"], meaning: "川の上にかけるみち", example: "橋をわたる", grade: Grade::Third },
    KanjiEntry { id: "g3-17", kanji: "銀", readings: &["ぎん"], meaning: "白くひかる金ぞく", example: "銀色の紙", grade: Grade::Third },
    KanjiEntry { id: "g3-18", kanji: "苦", readings: &["くるしい", "にがい", "く"], meaning: "つらい・にがい", example: "苦い薬", grade: Grade::Third },
    KanjiEntry { id: "g3-19", kanji: "軽", readings: &["かるい", "けい"], meaning: "おもくない", example: "軽いかばん", grade: Grade::Third },
    KanjiEntry { id: "g3-20", kanji: "湖", readings: &["みずうみ", "こ"], meaning: "陸にかこまれた大きな水たまり", example: "湖でボートにのる", grade: Grade::Third },
    KanjiEntry { id: "g3-21", kanji: "港", readings: &["みなと", "こう"], meaning: "船がとまるところ", example: "港に船が着く", grade: Grade::Third },
    KanjiEntry { id: "g3-22", kanji: "皿", readings: &["さら"], meaning: "食べものをのせるうつわ", example: "皿をあらう", grade: Grade::Third },
    KanjiEntry { id: "g3-23", kanji: "歯", readings: &["は", "し"], meaning: "口の中でかむところ", example: "歯をみがく", grade: Grade::Third },
    KanjiEntry { id: "g3-24", kanji: "島", readings: &["しま", "とう"], meaning: "海にかこまれた陸地", example: "島にわたる", grade: Grade::Third },
    KanjiEntry { id: "g3-25", kanji: "湯", readings: &["ゆ", "とう"], meaning: "あたためた水", example: "お湯をわかす", grade: Grade::Third },
    KanjiEntry { id: "g3-26", kanji: "鉄", readings: &["てつ"], meaning: "かたい金ぞく", example: "鉄ぼうであそぶ", grade: Grade::Third },
    KanjiEntry { id: "g3-27", kanji: "箱", readings: &["はこ"], meaning: "ものを入れるいれもの", example: "箱に入れる", grade: Grade::Third },
    KanjiEntry { id: "g3-28", kanji: "畑", readings: &["はたけ", "はた"], meaning: "野菜をそだてる土地", example: "畑をたがやす", grade: Grade::Third },
    KanjiEntry { id: "g3-29", kanji: "坂", readings: &["さか", "はん"], meaning: "かたむいたみち", example: "坂をのぼる", grade: Grade::Third },
    KanjiEntry { id: "g3-30", kanji: "鼻", readings: &["はな", "び"], meaning: "顔のまん中でにおいをかぐところ", example: "鼻がたかい", grade: Grade::Third },
    KanjiEntry { id: "g3-31", kanji: "氷", readings: &["こおり", "ひょう"], meaning: "水がこおったもの", example: "氷がとける", grade: Grade::Third },
    KanjiEntry { id: "g3-32", kanji: "笛", readings: &["ふえ", "てき"], meaning: "ふいて音を出す楽器", example: "笛をふく", grade: Grade::Third },
    KanjiEntry { id: "g3-33", kanji: "緑", readings: &["みどり", "りょく"], meaning: "草や葉の色", example: "緑の葉っぱ", grade: Grade::Third },
    KanjiEntry { id: "g3-34", kanji: "羊", readings: &["ひつじ", "よう"], meaning: "ふわふわの毛の動物", example: "羊の毛", grade: Grade::Third },
    KanjiEntry { id: "g3-35", kanji: "豆", readings: &["まめ", "とう", "ず"], meaning: "小さなたね", example: "豆まきをする", grade: Grade::Third },
];

/// 4年生の漢字
pub const GRADE4_LIST: &[KanjiEntry] = &[
    KanjiEntry { id: "g4-01", kanji: "愛", readings: &["あい"], meaning: "たいせつにおもう気持ち", example: "ペットを愛する", grade: Grade::Fourth },
    KanjiEntry { id: "g4-02", kanji: "塩", readings: &["しお", "えん"], meaning: "しょっぱい味のもと", example: "塩をふる", grade: Grade::Fourth },
    KanjiEntry { id: "g4-03", kanji: "芽", readings: &["め", "が"], meaning: "植物のでたばかりのところ", example: "芽が出る", grade: Grade::Fourth },
    KanjiEntry { id: "g4-04", kanji: "泣", readings: &["なく", "きゅう"], meaning: "なみだをながす", example: "赤ちゃんが泣く", grade: Grade::Fourth },
    KanjiEntry { id: "g4-05", kanji: "漁", readings: &["りょう", "ぎょ"], meaning: "魚をとること", example: "漁に出る", grade: Grade::Fourth },
    KanjiEntry { id: "g4-06", kanji: "鏡", readings: &["かがみ", "きょう"], meaning: "すがたをうつす道具", example: "鏡を見る", grade: Grade::Fourth },
    KanjiEntry { id: "g4-07", kanji: "競", readings: &["きそう", "きょう", "けい"], meaning: "どちらがすぐれているかあらそう", example: "かけっこで競う", grade: Grade::Fourth },
    KanjiEntry { id: "g4-08", kanji: "好", readings: &["すき", "このむ", "こう"], meaning: "気に入っている", example: "好きな食べ物", grade: Grade::Fourth },
    KanjiEntry { id: "g4-09", kanji: "菜", readings: &["な", "さい"], meaning: "食べられる草", example: "野菜を食べる", grade: Grade::Fourth },
    KanjiEntry { id: "g4-10", kanji: "札", readings: &["ふだ", "さつ"], meaning: "字を書いた小さな板・お金の紙", example: "名札をつける", grade: Grade::Fourth },
    KanjiEntry { id: "g4-11", kanji: "散", readings: &["ちる", "さん"], meaning: "ばらばらになる", example: "花が散る", grade: Grade::Fourth },
    KanjiEntry { id: "g4-12", kanji: "残", readings: &["のこる", "のこす", "ざん"], meaning: "あとにのこる", example: "教室に残る", grade: Grade::Fourth },
    KanjiEntry { id: "g4-13", kanji: "借", readings: &["かりる", "しゃく"], meaning: "人のものをつかわせてもらう", example: "本を借りる", grade: Grade::Fourth },
    KanjiEntry { id: "g4-14", kanji: "種", readings: &["たね", "しゅ"], meaning: "植物が生まれるもと", example: "種をまく", grade: Grade::Fourth },
    KanjiEntry { id: "g4-15", kanji: "祝", readings: &["いわう", "しゅく"], meaning: "めでたいことをよろこぶ", example: "誕生日を祝う", grade: Grade::Fourth },
    KanjiEntry { id: "g4-16", kanji: "笑", readings: &["わらう", "えむ", "しょう"], meaning: "うれしくて顔がほころぶ", example: "大声で笑う", grade: Grade::Fourth },
    KanjiEntry { id: "g4-17", kanji: "焼", readings: &["やく", "やける", "しょう"], meaning: "火でやく", example: "パンを焼く", grade: Grade::Fourth },
    KanjiEntry { id: "g4-18", kanji: "城", readings: &["しろ", "じょう"], meaning: "むかしのとのさまのすまい", example: "お城を見学する", grade: Grade::Fourth },
    KanjiEntry { id: "g4-19", kanji: "静", readings: &["しずか", "せい", "じょう"], meaning: "音がしない", example: "静かな教室", grade: Grade::Fourth },
    KanjiEntry { id: "g4-20", kanji: "巣", readings: &["す", "そう"], meaning: "鳥や虫のすみか", example: "鳥の巣", grade: Grade::Fourth },
    KanjiEntry { id: "g4-21", kanji: "束", readings: &["たば", "そく"], meaning: "ひとまとめにしたもの", example: "花束をわたす", grade: Grade::Fourth },
    KanjiEntry { id: "g4-22", kanji: "孫", readings: &["まご", "そん"], meaning: "子どもの子ども", example: "孫とあそぶ", grade: Grade::Fourth },
    KanjiEntry { id: "g4-23", kanji: "仲", readings: &["なか", "ちゅう"], meaning: "人と人とのあいだがら", example: "仲がいい友だち", grade: Grade::Fourth },
    KanjiEntry { id: "g4-24", kanji: "低", readings: &["ひくい", "てい"], meaning: "たかくない", example: "低い山", grade: Grade::Fourth },
    KanjiEntry { id: "g4-25", kanji: "灯", readings: &["ひ", "とう"], meaning: "あかり", example: "電灯をつける", grade: Grade::Fourth },
    KanjiEntry { id: "g4-26", kanji: "働", readings: &["はたらく", "どう"], meaning: "しごとをする", example: "お店で働く", grade: Grade::Fourth },
    KanjiEntry { id: "g4-27", kanji: "熱", readings: &["あつい", "ねつ"], meaning: "温度がたかい", example: "熱が出る", grade: Grade::Fourth },
    KanjiEntry { id: "g4-28", kanji: "梅", readings: &["うめ", "ばい"], meaning: "春のはじめにさく花の木", example: "梅の花", grade: Grade::Fourth },
    KanjiEntry { id: "g4-29", kanji: "飛", readings: &["とぶ", "ひ"], meaning: "空中をすすむ", example: "鳥が空を飛ぶ", grade: Grade::Fourth },
    KanjiEntry { id: "g4-30", kanji: "冷", readings: &["つめたい", "ひえる", "れい"], meaning: "温度がひくい", example: "冷たい水", grade: Grade::Fourth },
    KanjiEntry { id: "g4-31", kanji: "松", readings: &["まつ", "しょう"], meaning: "とがった葉の木", example: "松の木", grade: Grade::Fourth },
    KanjiEntry { id: "g4-32", kanji: "旗", readings: &["はた", "き"], meaning: "ぬのにしるしをつけたもの", example: "旗をふる", grade: Grade::Fourth },
    KanjiEntry { id: "g4-33", kanji: "初", readings: &["はじめて", "はじめ", "しょ"], meaning: "いちばんさいしょ", example: "初めての旅行", grade: Grade::Fourth },
    KanjiEntry { id: "g4-34", kanji: "鹿", readings: &["しか"], meaning: "つのがある動物", example: "公園の鹿", grade: Grade::Fourth },
];
