pub const ATTACH_HELP_TEXT: &str = r#"Arquivos
========

  draft <texto>     Define o rascunho sem enviar (vira a legenda do arquivo).
                    Sem texto, apaga o rascunho. Também aceita 'caption'.
  attach <caminho>  Lê o arquivo e o deixa pendente (imagem, vídeo, áudio ou
                    documento, pelo tipo de conteúdo).
  sendfile          Envia o arquivo ao número do solicitante. O rascunho atual
                    vira a legenda; sem rascunho usa a legenda padrão.
  cancel            Descarta o arquivo pendente.

Se o envio falhar, o arquivo continua pendente para nova tentativa.
"#;
